use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::configuration::{
    set_runtime_environment, ApplicationSettings, JWTSettings, PaymentGatewaySettings, Settings,
};
use crate::database::get_connection_pool;
use crate::email_client::{GenericEmailService, SmtpEmailClient};
use crate::errors::GenericError;
use crate::payment_client::PaymentClient;
use crate::repository::{PgRepository, Repository};
use crate::routes::main_route;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database)?;
        let repository: Arc<dyn Repository> = Arc::new(PgRepository::new(connection_pool));
        let email_client: Arc<dyn GenericEmailService> =
            Arc::new(SmtpEmailClient::new(&configuration.email_client)?);
        Self::build_with_services(configuration, repository, email_client).await
    }

    /// Builds the server around already constructed storage and mail handles.
    pub async fn build_with_services(
        configuration: Settings,
        repository: Arc<dyn Repository>,
        email_client: Arc<dyn GenericEmailService>,
    ) -> Result<Self, anyhow::Error> {
        set_runtime_environment(configuration.application.environment);
        let payment_client = PaymentClient::new(&configuration.payment_gateway)?;
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);
        let server = run(
            listener,
            repository,
            email_client,
            payment_client,
            configuration.jwt,
            configuration.application,
            configuration.payment_gateway,
        )?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    // Only returns when the application is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn run(
    listener: TcpListener,
    repository: Arc<dyn Repository>,
    email_client: Arc<dyn GenericEmailService>,
    payment_client: PaymentClient,
    jwt: JWTSettings,
    application: ApplicationSettings,
    payment_gateway: PaymentGatewaySettings,
) -> Result<Server, anyhow::Error> {
    let frontend_url = application.frontend_url.clone();
    let repository: web::Data<dyn Repository> = web::Data::from(repository);
    let email_client: web::Data<dyn GenericEmailService> = web::Data::from(email_client);
    let payment_client = web::Data::new(payment_client);
    let jwt = web::Data::new(jwt);
    let application = web::Data::new(application);
    let payment_gateway = web::Data::new(payment_gateway);
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                GenericError::ValidationError(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                GenericError::ValidationError(err.to_string()).into()
            }))
            .app_data(repository.clone())
            .app_data(email_client.clone())
            .app_data(payment_client.clone())
            .app_data(jwt.clone())
            .app_data(application.clone())
            .app_data(payment_gateway.clone())
            .configure(main_route)
    })
    .workers(4)
    .listen(listener)?
    .run();

    Ok(server)
}
