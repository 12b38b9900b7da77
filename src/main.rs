//! penmark - A static site generator for Markdown blogs.

mod build;
mod cli;
mod config;
mod content;
mod init;
mod logger;
mod serve;
mod site;
mod watch;

use anyhow::{Context, Result};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::{new_post, new_site};
use serve::PreviewServer;
use watch::WatchLoop;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: &'static SiteConfig = Box::leak(Box::new(SiteConfig::load(&cli)?));

    match &cli.command {
        Commands::Init { .. } => new_site(config),
        Commands::Build => build_site(config)
            .map(|_| ())
            .context("Build failed"),
        Commands::Watch { .. } => watch_site(config),
        Commands::Post(args) => new_post(config, args).map(|_| ()),
    }
}

/// Build once, then serve the output and rebuild on change until Ctrl+C.
///
/// The watch loop runs on its own thread. If it stops with an error the
/// server keeps serving the last output, and the error is returned after
/// shutdown.
fn watch_site(config: &'static SiteConfig) -> Result<()> {
    if let Err(err) = build_site(config) {
        log!("error"; "{:#}", anyhow::Error::new(err));
        log!("watch"; "initial build failed, waiting for changes");
    }

    let server = PreviewServer::bind(&config.serve, &config.build.output)?;
    server.install_ctrlc_handler()?;

    let watcher = std::thread::spawn(move || {
        let result = WatchLoop::new(config).run().context("Watch stopped");
        if let Err(err) = &result {
            log!("error"; "{err:#}");
            log!("serve"; "still serving the last build, press Ctrl+C to exit");
        }
        result
    });

    server.run();

    if watcher.is_finished() {
        match watcher.join() {
            Ok(result) => result?,
            Err(_) => anyhow::bail!("Watch thread panicked"),
        }
    }
    Ok(())
}
