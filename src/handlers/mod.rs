use maud::{html, Markup};

mod common;
mod feedback;
mod picker_view;
mod url_state;

pub use common::*;
pub use feedback::*;
pub use url_state::*;

// Shared components
pub struct Css(pub &'static str);

impl maud::Render for Css {
    fn render(&self) -> Markup {
        html! {
            link rel="stylesheet" type="text/css" href=(self.0);
        }
    }
}

pub fn header(site_prefix: &str, label: &str, current_route: &str) -> Markup {
    html! {
        header.page-header {
            nav {
                span .root-link {
                    a href="/" { "Admin" }
                }
                span .site-label { (label) }
            }
            nav.sub-nav {
                span .active[current_route.starts_with("/feedback")] {
                    a href=(format!("/{}/feedback", site_prefix)) { "Feedback" }
                }
                span .active[current_route.starts_with("/info")] {
                    a href=(format!("/{}/info", site_prefix)) { "Info" }
                }
            }
        }
    }
}

// Common types used across handlers
pub struct WorkDirPrefix(pub String);

pub type ThreadSafeWorkDir = crate::thread_safe_work_dir::ThreadSafeWorkDir;
