use actix_web::{
    get, middleware,
    web::{self},
    App, HttpResponse, HttpServer, Responder,
};
use actix_web_httpauth::middleware::HttpAuthentication;
use actix_web_opentelemetry::{PrometheusMetricsHandler, RequestMetrics, RequestTracing};
use chrono::{DateTime, Utc};
use clap::Parser;
use opentelemetry::global;
use opentelemetry_sdk::metrics::MeterProvider;
use std::{thread, time::Duration};

use feedback_admin::{
    errors::{self, ResultExt},
    handlers::{self, feedback_handler},
    serve_static_file, thread_safe_work_dir, workdir,
};

use handlers::{date_time_element, get_workdir, ThreadSafeWorkDir, WorkDirPrefix};
use thread_safe_work_dir::ThreadSafeWorkDir as ThreadSafeWorkDirImpl;
use workdir::WorkDir;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

struct StartTime(DateTime<Utc>);

#[derive(clap::Subcommand)]
enum Commands {
    /// Serve the feedback pages of one or more work directories
    Serve { work_dirs: Vec<String> },
}

#[get("/info")]
async fn info_handler(
    site: web::Data<WorkDirPrefix>,
    workdir: web::Data<ThreadSafeWorkDir>,
    start_time: web::Data<StartTime>,
) -> Result<impl Responder, actix_web::Error> {
    use maud::html;

    let workdir = get_workdir(&workdir)?;

    return Ok(html! {
        (handlers::Css("/res/styles.css"))
        (handlers::header(&site.0, &workdir.config.label, "/info"))
        main.info_main {
            h1.page_title { (workdir.config.label) }
            p {
                "The current site is: "
                code { (site.0) }
                " in "
                code { (workdir.config.timezone) }
            }
            p {
                "The earliest feedback was on "
                (date_time_element(workdir.feedback.earliest(), &workdir.tz))
            }
            p {
                "The latest feedback was on "
                (date_time_element(workdir.feedback.latest(), &workdir.tz))
            }
            p {
                "Feedback was last loaded on "
                (date_time_element(Some(workdir.loaded_at), &workdir.tz))
            }
            p {
                "The admin server was started on "
                (date_time_element(Some(start_time.0), &workdir.tz))
            }
            p {
                "This site has " (workdir.feedback.len()) " feedback items"
            }
        }
    });
}

#[get("/")]
async fn root_index_handler(
    site: web::Data<Vec<ThreadSafeWorkDir>>,
) -> Result<impl Responder, actix_web::Error> {
    use maud::html;

    let sites = site
        .iter()
        .map(|site| get_workdir_config(site))
        .collect::<Result<Vec<_>, _>>()?;

    return Ok(html! {
        (handlers::Css("/res/styles.css"))
        h1.page_title { "Loaded sites" }
        ul.site_list {
            @for (slug, label) in sites.iter() {
                li {
                    a.site_link href=(format!("/{}/feedback", slug)) { (label) }
                    " ("
                    a.site_link href=(format!("/{}/info", slug)) { "info" }
                    ")"
                }
            }
        }
    });
}

fn get_workdir_config(
    workdir: &ThreadSafeWorkDir,
) -> Result<(String, String), actix_web::Error> {
    let workdir = workdir
        .work_dir
        .try_read()
        .map_err(|_| handlers::workdir_locked_error())?;
    Ok((workdir.config.slug.clone(), workdir.config.label.clone()))
}

#[get("/healthz")]
async fn healthz_handler() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn run() -> errors::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { work_dirs } => {
            log::info!("Loading WorkDirs...");
            let mut work_dirs_vec = vec![];
            let mut slugs = vec![];
            for work_dir in work_dirs.iter() {
                log::info!("Loading WorkDir: {}", work_dir);
                let work_dir = WorkDir::new(work_dir.to_string())
                    .context(&format!("Failed to load WorkDir {}", work_dir))?;
                slugs.push(work_dir.config.slug.clone());
                let threadsafe_work_dir = ThreadSafeWorkDirImpl::new(work_dir);
                let update_clone = threadsafe_work_dir.clone();
                work_dirs_vec.push(threadsafe_work_dir);

                // Spawn a thread to watch the workdir for changes
                thread::spawn(move || loop {
                    thread::sleep(Duration::from_secs(60));
                    update_clone.check_for_updates();
                });
            }

            let registry = prometheus::Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .context("Failed to build prometheus exporter")?;
            let provider = MeterProvider::builder().with_reader(exporter).build();
            global::set_meter_provider(provider);

            let listen_address = std::env::var("LISTEN_ADDRESS").unwrap_or("127.0.0.1".to_owned());
            let start_time = Utc::now();

            log::info!("Starting HTTP server at http://{}:8080", listen_address);

            HttpServer::new(move || {
                let auth = HttpAuthentication::with_fn(handlers::validator);

                let mut app = App::new()
                    .wrap(auth) // Guard all routes with HTTP Basic Auth
                    .wrap(RequestTracing::new())
                    .wrap(RequestMetrics::default())
                    .route(
                        "/api/metrics",
                        web::get().to(PrometheusMetricsHandler::new(registry.clone())),
                    )
                    .app_data(web::Data::new(work_dirs_vec.clone()))
                    .app_data(web::Data::new(StartTime(start_time)))
                    .wrap(middleware::Logger::default())
                    .service(serve_static_file!("styles.css"))
                    .service(healthz_handler)
                    .service(root_index_handler);

                for (slug, workdir) in slugs.iter().zip(work_dirs_vec.iter()) {
                    app = app.service(
                        web::scope(slug)
                            .app_data(web::Data::new(workdir.clone()))
                            .app_data(web::Data::new(WorkDirPrefix(slug.clone())))
                            .service(info_handler)
                            .service(feedback_handler),
                    );
                }

                app
            })
            .bind((listen_address, 8080))?
            .run()
            .await?;

            Ok(())
        }
    }
}

#[actix_web::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        ::std::process::exit(1);
    }
}
