use anyhow::{Context, Result};
use clap::Parser;
use invest_planner::cli::{self, interactive};
use invest_planner::generator::outlet::{self, SummaryMode, render_summary};
use invest_planner::launch;
use invest_planner::utils::logger;

#[tokio::main]
async fn main() -> Result<()> {
    // 密钥文件可选，进程环境变量优先
    dotenvy::from_filename("secrets.env").ok();
    dotenvy::dotenv().ok();

    let args = cli::Args::parse();
    let inputs = args.plan_inputs();
    let config = args.into_config()?;
    logger::init_logger(config.verbose, config.log_json);

    let request = interactive::complete_from_stdin(inputs)?;
    let result = launch(&config, request)
        .await
        .context("Investment planning failed")?;

    println!("\n{}", render_summary(&result, SummaryMode::Full));
    println!("{}", result.investment_plan);

    if let Some(output_path) = &config.output_path {
        let written = outlet::save(&result, output_path).await?;
        for path in written {
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}
