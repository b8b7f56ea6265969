use school_payment_gateway::commands::run_custom_commands;
use school_payment_gateway::configuration::get_configuration;
use school_payment_gateway::startup::Application;
use school_payment_gateway::telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    let subscriber = get_subscriber(
        "school-payment-gateway".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let args: Vec<String> = std::env::args().collect();
    let configuration = get_configuration()?;
    if args.len() > 1 {
        run_custom_commands(args, &configuration).await?;
    } else {
        let application = Application::build(configuration).await?;
        application.run_until_stopped().await?;
    }

    Ok(())
}
