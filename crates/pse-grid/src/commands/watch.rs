//! `watch`: run the integration under an in-process host until Ctrl-C.

use std::future::Future;

use tokio::sync::watch;
use tracing::{info, warn};

use pse_grid_core::{ConfigEntry, Host, IntegrationInstance, setup_entry};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::{CLI_ENTRY_ID, render_sensors};

pub async fn handle(
    args: WatchArgs,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let host = Host::new();
    let entry = ConfigEntry::new(CLI_ENTRY_ID, settings.entry_options(args.interval));
    let interval = entry.options.scan_interval;
    let instance = setup_entry(&host, entry, settings.client()?).await?;

    // Subscribe before startup so the first refresh is not missed.
    let versions = instance.store().subscribe();
    host.mark_running();
    info!(
        interval = %humantime::format_duration(interval),
        endpoint = %settings.endpoint,
        "watching grid statistics"
    );

    let result = print_updates(
        &instance,
        settings,
        versions,
        |out| output::print_output(&out, global.quiet),
        ctrl_c(),
    )
    .await;

    host.mark_stopping();
    instance.unload().await;
    result
}

/// Render the sensors once per published snapshot until `stop` resolves.
async fn print_updates(
    instance: &IntegrationInstance,
    settings: &Settings,
    mut versions: watch::Receiver<u64>,
    mut emit: impl FnMut(String),
    stop: impl Future<Output = ()>,
) -> Result<(), CliError> {
    tokio::pin!(stop);
    loop {
        tokio::select! {
            biased;
            changed = versions.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                emit(render_sensors(instance, settings)?);
            }
            () = &mut stop => return Ok(()),
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, stopping");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::oneshot;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use pse_grid_config::Config;

    use super::*;
    use crate::cli::{ColorMode, OutputFormat};

    async fn grid_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transmissionMapService"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "podsumowanie": { "zapotrzebowanie": 4800, "generacja": 5000 },
                    "przesyly": [
                        { "id": "SE", "wartosc": 100, "wartosc_plan": 120, "rownolegly": 5 }
                    ]
                }
            })))
            .mount(&server)
            .await;
        server
    }

    fn plain_settings(server: &MockServer) -> Settings {
        Settings {
            config: Config::default(),
            endpoint: format!("{}/transmissionMapService", server.uri())
                .parse()
                .unwrap(),
            timeout: Duration::from_secs(5),
            output: OutputFormat::Plain,
            color: ColorMode::Never,
        }
    }

    #[tokio::test]
    async fn prints_each_refresh_until_stopped() {
        let server = grid_server().await;
        let settings = plain_settings(&server);

        let host = Host::new();
        let entry = ConfigEntry::new(CLI_ENTRY_ID, settings.entry_options(Some(5)));
        let instance = setup_entry(&host, entry, settings.client().unwrap())
            .await
            .unwrap();
        assert_eq!(instance.coordinator().interval(), Duration::from_secs(300));

        let versions = instance.store().subscribe();
        host.mark_running();

        let mut printed = Vec::new();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let driver = async {
            let mut seen = instance.store().subscribe();
            seen.wait_for(|v| *v >= 1).await.unwrap();
            assert!(instance.coordinator().request_refresh().await.is_updated());
            seen.wait_for(|v| *v >= 2).await.unwrap();
            let _ = stop_tx.send(());
        };
        let stop = async {
            let _ = stop_rx.await;
        };

        let (result, ()) = tokio::join!(
            print_updates(&instance, &settings, versions, |out| printed.push(out), stop),
            driver,
        );

        result.unwrap();
        assert_eq!(printed.len(), 2);
        assert!(printed.iter().all(|out| out.contains("pse-link-se=100")));
        assert!(printed[0].contains("pse-power-state-binary=on"));

        host.mark_stopping();
        instance.unload().await;
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn returns_when_stopped_before_any_refresh() {
        let server = grid_server().await;
        let settings = plain_settings(&server);

        let host = Host::new();
        let entry = ConfigEntry::new(CLI_ENTRY_ID, settings.entry_options(None));
        let instance = setup_entry(&host, entry, settings.client().unwrap())
            .await
            .unwrap();

        let mut printed = Vec::new();
        print_updates(
            &instance,
            &settings,
            instance.store().subscribe(),
            |out| printed.push(out),
            async {},
        )
        .await
        .unwrap();

        assert!(printed.is_empty());
        instance.unload().await;
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
