//! OTP SMS Gateway (`otpgw`)
//!
//! Binds the SMPP session, keeps it alive, and exits cleanly on Ctrl+C or
//! SIGTERM.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use common::service_bootstrap::{self, ServiceInfo};
use common::ServiceArgs;
use errors::{ServiceError, ServiceErrorTrait, ServiceResult};
use otpgw::{runtime, AppConfig};
use smpp_link::TcpTransport;

#[tokio::main]
async fn main() {
    let args = ServiceArgs::parse();
    let service_info = ServiceInfo::new(
        "otpgw",
        env!("CARGO_PKG_VERSION"),
        "OTP SMS Gateway - SMPP Session Manager",
    );

    // Logging comes from the config file, so config errors go to stderr
    let config_path = args.config_path(&service_info.name);
    let config = match AppConfig::load(&config_path, args.config.is_some()) {
        Ok(config) => config,
        Err(e) => {
            let err = ServiceError::from(e);
            eprintln!("otpgw: {err}");
            std::process::exit(err.exit_code());
        },
    };

    if let Err(e) = run(&args, &service_info, config).await {
        error!(code = e.error_code(), "otpgw exiting: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: &ServiceArgs, service_info: &ServiceInfo, config: AppConfig) -> ServiceResult<()> {
    service_bootstrap::init_logging(service_info, args, &config.logging)?;
    if !args.no_color {
        service_bootstrap::print_startup_banner(service_info);
    }

    config.validate()?;
    info!(
        endpoint = %config.smpp.endpoint(),
        system_id = %config.smpp.system_id,
        "Configuration loaded"
    );

    // Validation mode: validate and exit
    if args.validate {
        info!("Validation completed successfully");
        return Ok(());
    }

    let transport = Arc::new(TcpTransport::new(config.session.transport_options()));
    let gateway = runtime::start(&config, transport).await?;

    common::shutdown::wait_for_shutdown().await;
    gateway.shutdown().await;
    Ok(())
}
