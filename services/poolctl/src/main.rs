//! Token pool operator CLI
//!
//! Runs engine operations against a credential file:
//!
//! ```text
//! poolctl --store tokens.json migrate
//! poolctl --store tokens.json add <provider> <value> [alias] [weight]
//! poolctl --store tokens.json select <provider> [policy]
//! poolctl --store tokens.json recover <provider>
//! ```
//!
//! The master key resolves through the usual chain (env var, key file,
//! generate-on-first-run). Thresholds come from `TOKEN_ERROR_THRESHOLD` /
//! `TOKEN_COOLDOWN_SECS` or their defaults. The provider's policy is given
//! on the command line since this tool has no provider database.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use token_crypto::{CredentialCipher, load_master_key};
use token_pool::{OpContext, PoolConfig, TokenPoolService};
use token_store::{JsonFileStore, ProviderPool, SelectionPolicy, StaticProviders};

fn usage() -> ! {
    eprintln!(
        "usage: poolctl --store <path> <command>\n\
         commands:\n\
         \x20 migrate                                re-encrypt legacy credentials\n\
         \x20 add <provider> <value> [alias] [weight] add a credential\n\
         \x20 select <provider> [policy]              select and print a credential value\n\
         \x20 recover <provider>                      heal all quarantined credentials"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut store_path = None;
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--store" {
            store_path = args.get(i + 1).cloned();
            i += 2;
        } else {
            rest.push(args[i].clone());
            i += 1;
        }
    }
    let Some(store_path) = store_path else { usage() };
    if rest.is_empty() {
        usage()
    }

    let key = load_master_key().context("loading master key")?;
    let cipher = Arc::new(CredentialCipher::new(&key).context("building cipher")?);
    let store = Arc::new(
        JsonFileStore::load(store_path.into())
            .await
            .context("loading credential store")?,
    );
    let config = PoolConfig::from_env().context("loading pool config")?;
    let ctx = OpContext::new("poolctl");

    // One synthetic provider entry per invocation; the real backend has a
    // provider database behind ProviderDirectory.
    let policy: SelectionPolicy = match rest.first().map(String::as_str) {
        Some("select") => rest
            .get(2)
            .map(|p| p.parse().map_err(anyhow::Error::msg))
            .transpose()?
            .unwrap_or(SelectionPolicy::RoundRobin),
        _ => SelectionPolicy::RoundRobin,
    };
    let provider_id = rest.get(1).cloned().unwrap_or_default();
    let providers = Arc::new(StaticProviders::new().with_pool(
        provider_id.clone(),
        ProviderPool {
            policy,
            fallback_on_error: false,
        },
    ));

    let service = TokenPoolService::new(store, providers, cipher, &config);

    match rest[0].as_str() {
        "migrate" => {
            let report = service.run_migration(&ctx).await?;
            println!(
                "migrated {} of {} legacy credentials ({} failed)",
                report.succeeded, report.total, report.failed
            );
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        "add" => {
            if rest.len() < 3 {
                usage()
            }
            let alias = rest.get(3).cloned();
            let weight: u32 = rest
                .get(4)
                .map(|w| w.parse().context("weight must be an integer"))
                .transpose()?
                .unwrap_or(1);
            let credential = service
                .add_credential(&ctx, &provider_id, alias, weight, &rest[2])
                .await?;
            println!("added credential {} ({})", credential.id, credential.alias);
        }
        "select" => {
            if rest.len() < 2 {
                usage()
            }
            let selected = service.select_credential(&ctx, &provider_id).await?;
            // Printing the value is this command's purpose (credential
            // helper); it is never logged.
            println!("{}", selected.value.expose_str());
        }
        "recover" => {
            if rest.len() < 2 {
                usage()
            }
            let healed = service.recover_all(&ctx, &provider_id).await?;
            println!("recovered {healed} credentials");
        }
        other => bail!("unknown command: {other}"),
    }

    Ok(())
}
