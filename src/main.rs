use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use vetogate::audit::audit_channel;
use vetogate::config::GuardConfig;
use vetogate::engine::{DecisionEngine, Verdict};
use vetogate::policy::{PolicyStore, ResourceKey};
use vetogate::stats::CounterSet;
use vetogate::{logging, metrics};

#[tokio::main]
async fn main() {
    logging::init_logging();
    metrics::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match GuardConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("vetogate: {}", e);
                std::process::exit(1);
            }
        },
        None => GuardConfig::default(),
    };

    let policy = Arc::new(PolicyStore::new(
        config.agent_capacity,
        config.whitelist_capacity,
    ));
    let counters = Arc::new(CounterSet::new());
    let (emitter, mut audit_rx) = audit_channel(config.audit_buffer_bytes);
    let engine = Arc::new(DecisionEngine::new(
        Arc::clone(&policy),
        Arc::clone(&counters),
        config.key_strategy.resolver(),
        emitter.clone(),
    ));

    seed_policy(&config, &policy);
    info!(
        agents = policy.agent_count(),
        entries = policy.whitelist_len(),
        strategy = ?config.key_strategy,
        "policy seeded"
    );

    // Audit consumer: drains the decision stream outside the enforcement path
    tokio::spawn(async move {
        while let Some(record) = audit_rx.recv().await {
            match record.verdict {
                Verdict::Block => warn!(
                    pid = record.pid,
                    uid = record.uid,
                    resource = %record.resource_str(),
                    ts = record.timestamp_ns,
                    "BLOCKED"
                ),
                Verdict::Allow => debug!(
                    pid = record.pid,
                    uid = record.uid,
                    resource = %record.resource_str(),
                    "allowed"
                ),
            }
        }
    });

    #[cfg(feature = "ebpf")]
    {
        use vetogate::enforcer::LsmEnforcer;

        if let Some(mut enforcer) = LsmEnforcer::new() {
            if let Err(e) = enforcer.sync_policy(&policy).await {
                warn!("policy sync failed: {}", e);
            }
            enforcer.start_collector(emitter.clone());
            metrics::set_enforcement(true);

            let enforcer = Arc::new(enforcer);
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(Duration::from_secs(30));
                loop {
                    tick.tick().await;
                    if let Ok(snap) = enforcer.read_counters().await {
                        debug!(
                            checks = snap.checks,
                            blocks = snap.blocks,
                            allows = snap.allows,
                            "kernel decision counters"
                        );
                    }
                }
            });
        }
    }

    // Periodic metrics collection
    {
        let engine = Arc::clone(&engine);
        let policy = Arc::clone(&policy);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(10));
            loop {
                tick.tick().await;
                metrics::update_decisions(&engine.counters(), engine.audit_dropped());
                metrics::update_policy(policy.agent_count(), policy.whitelist_len());
            }
        });
    }

    info!("vetogate running (ctrl-c to exit)");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("signal wait failed: {}", e);
    }

    let snap = engine.counters();
    info!(
        checks = snap.checks,
        blocks = snap.blocks,
        allows = snap.allows,
        audit_dropped = engine.audit_dropped(),
        "shutting down"
    );
}

/// Apply the configured seed policy through the control-plane operations.
fn seed_policy(config: &GuardConfig, policy: &PolicyStore) {
    for &pid in &config.seed_agents {
        if let Err(e) = policy.register_agent(pid) {
            warn!(pid, "seed agent rejected: {}", e);
        }
    }
    for (entries, verdict) in [
        (&config.seed_allow, Verdict::Allow),
        (&config.seed_block, Verdict::Block),
    ] {
        for entry in entries {
            match ResourceKey::new(entry.as_bytes()) {
                Ok(key) => {
                    if let Err(e) = policy.set_policy(key, verdict) {
                        warn!(resource = %entry, "seed entry rejected: {}", e);
                    }
                }
                Err(e) => warn!(resource = %entry, "seed entry unusable: {}", e),
            }
        }
    }
}
