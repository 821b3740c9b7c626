use actix_web::web;
use actix_web_httpauth::extractors::basic::{BasicAuth, Config};
use actix_web_httpauth::extractors::AuthenticationError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

// Authentication validator function
pub async fn validator(
    req: actix_web::dev::ServiceRequest,
    credentials: Option<BasicAuth>,
) -> Result<actix_web::dev::ServiceRequest, (actix_web::Error, actix_web::dev::ServiceRequest)> {
    // Allow metrics and healthz requests to pass through
    if req.path() == "/api/metrics" || req.path() == "/healthz" {
        return Ok(req);
    }

    let expected_username = std::env::var("BASIC_AUTH_USERNAME").unwrap_or_default();
    let expected_password = std::env::var("BASIC_AUTH_PASSWORD").unwrap_or_default();

    // If auth environment variables are not set, don't enforce authentication
    if expected_username.is_empty() || expected_password.is_empty() {
        return Ok(req);
    }

    let credentials = if let Some(credentials) = credentials {
        credentials
    } else {
        return Err((
            actix_web::error::ErrorBadRequest("no basic auth header"),
            req,
        ));
    };

    let password = credentials.password().unwrap_or_default();
    if credentials.user_id() == expected_username && password == expected_password {
        Ok(req)
    } else {
        log::warn!("rejected credentials for user {}", credentials.user_id());
        let config = req
            .app_data::<Config>()
            .cloned()
            .unwrap_or_default()
            .realm("Feedback Admin");

        Err((AuthenticationError::from(config).into(), req))
    }
}

// Common error response for locked workdir
pub fn workdir_locked_error() -> actix_web::Error {
    actix_web::error::ErrorServiceUnavailable("Work directory is locked")
}

// Helper function to get workdir from ThreadSafeWorkDir
pub fn get_workdir<'a>(
    workdir: &'a web::Data<super::ThreadSafeWorkDir>,
) -> Result<std::sync::RwLockReadGuard<'a, crate::workdir::WorkDir>, actix_web::Error> {
    workdir
        .work_dir
        .try_read()
        .map_err(|_| workdir_locked_error())
}

/// `<time>` in the work dir's zone, or "never".
pub fn date_time_element(timestamp: Option<DateTime<Utc>>, tz: &Tz) -> maud::Markup {
    use maud::html;

    if let Some(time) = timestamp {
        let local = time.with_timezone(tz);
        html! {
            time datetime=(time.to_rfc3339()) title=(local.to_rfc3339()) {
                (local.format("%b %-d, %Y %H:%M"))
            }
        }
    } else {
        html! {
            span { "never" }
        }
    }
}
