/// Serve a file from `src/res`, preferring the copy on disk so styles can
/// be edited without a rebuild.
#[macro_export]
macro_rules! serve_static_file {
    ($file:expr) => {
        web::resource(concat!("res/", $file)).route(web::get().to(|| async move {
            let path = std::path::Path::new("src/res").join($file);

            match std::fs::read_to_string(&path) {
                Ok(contents) if path.is_file() => HttpResponse::Ok()
                    .append_header(("x-resource-source", "disk"))
                    .body(contents),
                _ => HttpResponse::Ok()
                    .append_header(("x-resource-source", "embedded"))
                    .body(include_str!(concat!("res/", $file))),
            }
        }))
    };
}

pub mod errors;
pub mod feedback;
pub mod handlers;
pub mod range_picker;
pub mod serde;
pub mod thread_safe_work_dir;
pub mod workdir;
