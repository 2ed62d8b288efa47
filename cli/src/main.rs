//! bxlchat binary: interactive BuildXL assistant on the console.
//!
//! Reads `OPENAI_SETTINGS` (and optional CloudBuild overrides) from the environment, `.env` or
//! `$XDG_CONFIG_HOME/bxlchat/config.toml`, then runs the chat loop.

mod log_format;
mod logging;
mod repl;

use std::io::Write;
use std::sync::Arc;

use bxlchat::cloudbuild::{
    BuildSubmitter, InteractiveBrowserTokenProvider, StaticTokenProvider, TokenProvider,
};
use bxlchat::{ChatOpenAI, ChatSession, CreateBuildRequestTool, SubmitBuildRequestTool, ToolRegistry};
use clap::Parser;
use config::{CloudBuildSettings, Settings};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(name = "bxlchat", version)]
#[command(about = "Chat with an assistant that knows BuildXL and can queue CloudBuild builds")]
#[command(
    after_help = "Environment:\n  OPENAI_SETTINGS          <useOpenAI>;<model>;<endpoint>;<apiKey>;<orgId>\n  CLOUDBUILD_BASE_URL      CloudBuild service address\n  CLOUDBUILD_ACCESS_TOKEN  bearer token; skips interactive sign-in\n  LOG_FILE, RUST_LOG       log destination and filter"
)]
struct Args {}

fn token_provider(cloudbuild: &CloudBuildSettings) -> Arc<dyn TokenProvider> {
    match &cloudbuild.access_token {
        Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
        None => Arc::new(InteractiveBrowserTokenProvider::new(cloudbuild)),
    }
}

fn build_registry(
    cloudbuild: &CloudBuildSettings,
) -> Result<ToolRegistry, Box<dyn std::error::Error>> {
    let submitter = BuildSubmitter::new(cloudbuild, token_provider(cloudbuild))?;
    Ok(ToolRegistry::new()
        .with(Box::new(CreateBuildRequestTool::new(
            cloudbuild.requester.clone(),
        )))
        .with(Box::new(SubmitBuildRequestTool::new(Arc::new(submitter)))))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _args = Args::parse();

    config::load_and_apply("bxlchat", None).ok();
    let _log_guard = logging::init()?;

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            println!("Error reading settings: {}", e);
            std::process::exit(1);
        }
    };

    println!("UseOpenAI: {}", settings.use_openai);
    println!("Model: {}", settings.model);

    let cloudbuild = CloudBuildSettings::from_env();
    tracing::info!(?cloudbuild, "CloudBuild settings");

    let registry = Arc::new(build_registry(&cloudbuild)?);
    let llm = ChatOpenAI::from_settings(&settings).with_tools(registry.list());
    tracing::info!(model = llm.model(), url = llm.url(), "chat client ready");
    let mut session = ChatSession::new(Arc::new(llm), registry);

    println!("{}", repl::GREETING);
    let mut stdout = std::io::stdout();
    repl::run_repl_loop(&mut session, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_has_only_help_and_version() {
        Args::command().debug_assert();
        assert!(Args::try_parse_from(["bxlchat"]).is_ok());
        assert!(Args::try_parse_from(["bxlchat", "--model", "x"]).is_err());
    }

    #[test]
    fn registry_has_both_tools() {
        let cloudbuild = CloudBuildSettings {
            access_token: Some("tok".into()),
            ..Default::default()
        };
        let registry = build_registry(&cloudbuild).unwrap();
        assert_eq!(
            registry.names(),
            vec![bxlchat::TOOL_CREATE_BUILD_REQUEST, bxlchat::TOOL_SUBMIT_BUILD_REQUEST]
        );
    }

    #[test]
    fn invalid_base_url_fails_registry_build() {
        let cloudbuild = CloudBuildSettings::default().with_base_url("not a url");
        assert!(build_registry(&cloudbuild).is_err());
    }
}
