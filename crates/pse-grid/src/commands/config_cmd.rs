//! Config subcommand handlers.

use pse_grid_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

fn plain(cfg: &Config) -> String {
    [
        format!("http.endpoint={}", cfg.http.endpoint),
        format!("http.timeout={}", cfg.http.timeout),
        format!("poll.interval={}", cfg.poll.interval),
        format!("defaults.output={}", cfg.defaults.output),
        format!("defaults.color={}", cfg.defaults.color),
    ]
    .join("\n")
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show: file + environment, after validation ──────────────
        ConfigCommand::Show => {
            let cfg = pse_grid_config::load_config()?;
            let detail = cfg.to_toml()?;
            let out = output::render_single(
                config::output_format(global),
                &cfg,
                |_| detail.clone(),
                plain,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            let path = pse_grid_config::config_path();
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
