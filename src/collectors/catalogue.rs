//! Static registration of the built-in collection tasks.

use log::info;

use crate::capabilities::{
    CAP_DISK_INFO, CAP_KERNEL_INFO, CAP_PAM, CAP_SNMP, CAP_XAPI_CLUSTERD, CAP_XENSERVER_CONFIG,
    CAP_XENSERVER_DATABASES, CAP_XENSTORE,
};
use crate::config::CollectorConfig;
use crate::filters::{clusterd, db, snmp, xenstore, DbFilter};
use crate::registry::{CollectionSession, RegistrationOutcome};

/// Register every built-in task whose capability is active
pub fn register_builtin_tasks(
    session: &mut CollectionSession,
    config: &CollectorConfig,
) -> Vec<RegistrationOutcome> {
    let mut outcomes = Vec::new();
    let paths = &config.paths;

    // Databases
    let db_conf = paths.db_conf.clone();
    let db_filter = DbFilter::new(config.db_redaction.clone());
    outcomes.push(session.register_callback(CAP_XENSERVER_DATABASES, "xapi-db.xml", move |_| {
        db::dump_xapi_db(&db_conf, &db_filter)
    }));

    let clusterd_db = paths.clusterd_db.clone();
    outcomes.push(session.register_callback(CAP_XAPI_CLUSTERD, "xapi-clusterd-db", move |_| {
        clusterd::filter_xapi_clusterd_db(&clusterd_db)
    }));

    // SNMP
    let snmp_xs_conf = paths.snmp_xs_conf.clone();
    outcomes.push(session.register_callback(CAP_SNMP, "snmp_xs_conf", move |_| {
        snmp::filter_snmp_xs_conf(&snmp_xs_conf)
    }));
    let snmpd_xs_conf = paths.snmpd_xs_conf.clone();
    outcomes.push(session.register_callback(CAP_SNMP, "snmpd_xs_conf", move |_| {
        snmp::filter_snmpd_xs_conf(&snmpd_xs_conf)
    }));
    let snmpd_conf = paths.snmpd_conf.clone();
    outcomes.push(session.register_callback(CAP_SNMP, "snmpd_conf", move |_| {
        snmp::filter_snmpd_conf(&snmpd_conf)
    }));

    // xenstore
    outcomes.push(session.register_command(
        CAP_XENSTORE,
        ["xenstore-ls", "-f"],
        None,
        Some(xenstore::xenstore_filter(&config.xenstore_secret_keys)),
    ));

    // Host configuration
    outcomes.extend(session.register_file_copy(CAP_XENSERVER_CONFIG, &[&paths.inventory]));
    outcomes.extend(session.register_files(CAP_PAM, &["/etc/pam.d/*"]));
    outcomes.push(session.register_command(CAP_KERNEL_INFO, ["uname", "-a"], None, None));
    outcomes.extend(session.register_file_copy(CAP_KERNEL_INFO, &["/proc/cmdline", "/proc/modules"]));
    outcomes.push(session.register_command(CAP_DISK_INFO, ["df", "-h"], None, None));

    for rule in &config.listings {
        outcomes.extend(session.register_files(&rule.capability, rule.patterns.as_slice()));
    }

    let registered = outcomes.iter().filter(|o| o.is_registered()).count();
    info!(
        "Registered {} built-in tasks ({} skipped)",
        registered,
        outcomes.len() - registered
    );
    outcomes
}
