use actix_web::{get, web, HttpResponse};
use chrono::DateTime;
use chrono_tz::Tz;
use maud::{html, Markup};

use crate::feedback::{default_range, FeedbackFilter, FeedbackStats, FlaggedQuery, RatingFilter};
use crate::range_picker::{format_range, PickerOptions};
use crate::workdir::WorkDir;

use super::picker_view::render_picker;
use super::url_state::{FeedbackQuery, FeedbackUrlState, PageAction};
use super::{date_time_element, get_workdir, ThreadSafeWorkDir, WorkDirPrefix};

fn feedback_layout(workdir: &WorkDir, content: Markup) -> Markup {
    html! {
        (maud::DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Feedback - " (workdir.config.label) }
                (super::Css("/res/styles.css"))
            }
            body {
                (super::header(&workdir.config.slug, &workdir.config.label, "/feedback"))
                main.feedback_main {
                    h1.page_title { "User Feedback" }
                    (content)
                }
            }
        }
    }
}

/// Page state after `action`. Calendar paging never touches the picker;
/// everything else runs through it and an apply moves the committed range.
pub fn next_state(
    state: &FeedbackUrlState,
    action: &PageAction,
    options: PickerOptions,
    now: DateTime<Tz>,
) -> FeedbackUrlState {
    let Some(event) = action.picker_event() else {
        return state.shift_month(*action == PageAction::NextMonth);
    };

    let mut committed = None;
    let popover = {
        let mut picker = state.picker(options, |range| committed = Some(range));
        if !picker.dispatch(event.clone(), now) {
            log::debug!("Ignored {} for {}", action, state.site_prefix);
        }
        state.capture(&picker, &event)
    };

    let mut next = FeedbackUrlState {
        popover,
        ..state.clone()
    };
    if let Some(range) = committed {
        log::info!(
            "{} feedback range set to {}",
            state.site_prefix,
            format_range(&range)
        );
        next.committed = range;
    }
    next
}

fn stats_panel(stats: &FeedbackStats) -> Markup {
    html! {
        .stats_panel {
            .stat_card {
                .stat_value { (stats.total) }
                .stat_label { "Total Feedback" }
            }
            .stat_card.positive {
                .stat_value { (stats.positive) }
                .stat_label { "Positive" }
            }
            .stat_card.negative {
                .stat_value { (stats.negative) }
                .stat_label { "Negative" }
            }
            .stat_card {
                .stat_value { (stats.positive_percent()) "%" }
                .stat_label { "Satisfaction" }
            }
        }
    }
}

/// Guidance shown under a non-empty result list. Counts cover all feedback.
fn insights_panel(stats: &FeedbackStats) -> Markup {
    html! {
        section.insights_panel {
            h3 { "Insights & Actions" }
            ul {
                @if stats.negative > 0 {
                    li {
                        strong { (stats.negative) " negative feedback entries" }
                        " - Review these to identify knowledge gaps and improve responses."
                    }
                }
                @if stats.positive > 0 {
                    li {
                        strong { (stats.positive) " positive feedback entries" }
                        " - These indicate successful responses. Analyze patterns for best practices."
                    }
                }
                li {
                    "Consider adding more relevant documentation to the knowledge base for queries with negative feedback."
                }
            }
        }
    }
}

fn feedback_card(item: &FlaggedQuery, tz: &Tz) -> Markup {
    html! {
        article.feedback_card .positive[item.is_positive()] .negative[item.is_negative()] {
            header.feedback_meta {
                span.feedback_rating {
                    @if item.is_positive() { "\u{1F44D}" } @else { "\u{1F44E}" }
                }
                (date_time_element(Some(item.created_at), tz))
                @if let Some(conversation_id) = &item.conversation_id {
                    code.feedback_conversation { (conversation_id) }
                }
            }
            section.feedback_query {
                h3 { "Query" }
                p { (item.query) }
            }
            section.feedback_response {
                h3 { "Response" }
                p { (item.response) }
            }
            @if let Some(comment) = &item.comment {
                section.feedback_comment {
                    h3 { "Comment" }
                    p { (comment) }
                }
            }
        }
    }
}

fn render_feedback_page(workdir: &WorkDir, state: &FeedbackUrlState, now: DateTime<Tz>) -> Markup {
    let filter = FeedbackFilter {
        rating: state.rating,
        range: state.committed.clone(),
    };
    let stats = FeedbackStats::collect(workdir.feedback.values());
    let matching = filter.apply(workdir.feedback.values());
    let cleared = state.cleared(default_range(now, workdir.config.default_range_days));
    let picker = state.picker(workdir.config.picker_options(), |_| {});

    feedback_layout(
        workdir,
        html! {
            (stats_panel(&stats))
            section.filter_panel {
                .filter_header {
                    h2 { "Filters" }
                    a.clear_filters href=(cleared.to_url()) { "Clear Filters" }
                    a.toggle_filters href=(state.with_filters_shown(!state.show_filters).to_url()) {
                        @if state.show_filters { "Hide" } @else { "Show" }
                    }
                }
                @if state.show_filters {
                    .filter_bar {
                        .rating_filter {
                            @for rating in RatingFilter::ALL {
                                a.rating_option .active[rating == state.rating]
                                    href=(state.with_rating(rating).to_url()) {
                                    (rating.label())
                                }
                            }
                        }
                        (render_picker(state, &picker, now))
                    }
                }
            }
            p.result_count {
                "Showing " (matching.len()) " of " (stats.total) " feedback items"
            }
            @if stats.total == 0 {
                p.empty_state { "No feedback yet" }
            } @else if matching.is_empty() {
                p.empty_state { "No feedback matching filters" }
            } @else {
                .feedback_list {
                    @for item in &matching {
                        (feedback_card(item, &workdir.tz))
                    }
                }
                (insights_panel(&stats))
            }
        },
    )
}

#[get("/feedback")]
pub async fn feedback_handler(
    workdir: web::Data<ThreadSafeWorkDir>,
    workdir_prefix: web::Data<WorkDirPrefix>,
    query: web::Query<FeedbackQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let workdir = get_workdir(&workdir)?;
    let now = workdir.now();
    let default_days = workdir.config.default_range_days;

    let state = FeedbackUrlState::from_query(&workdir_prefix.0, &query, &workdir.tz, || {
        default_range(now, default_days)
    })
    .map_err(actix_web::error::ErrorBadRequest)?;

    if let Some(action) = query.action.as_deref() {
        let action: PageAction = action.parse().map_err(actix_web::error::ErrorBadRequest)?;
        let next = next_state(&state, &action, workdir.config.picker_options(), now);
        return Ok(HttpResponse::SeeOther()
            .append_header(("Location", next.to_url()))
            .finish());
    }

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_feedback_page(&workdir, &state, now).into_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackItems;
    use crate::handlers::PopoverUrlState;
    use crate::range_picker::{local_midnight, DateRange, Preset, PresetResolver};
    use crate::workdir::Config;
    use actix_web::http::{header::LOCATION, StatusCode};
    use actix_web::{test as actix_test, App};
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::America::New_York;
    use std::path::PathBuf;

    fn day(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn test_now() -> DateTime<Tz> {
        New_York.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).single().unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(
            local_midnight(&New_York, day(1, 1)),
            local_midnight(&New_York, day(1, 31)),
        )
        .unwrap()
    }

    fn closed_state() -> FeedbackUrlState {
        FeedbackUrlState {
            site_prefix: "acme".to_string(),
            rating: RatingFilter::All,
            committed: january(),
            show_filters: true,
            popover: PopoverUrlState::Closed,
        }
    }

    fn step(state: &FeedbackUrlState, action: PageAction) -> FeedbackUrlState {
        next_state(state, &action, PickerOptions::default(), test_now())
    }

    #[test]
    fn test_apply_after_preset_commits_and_closes() {
        let opened = step(&closed_state(), PageAction::Trigger);
        assert!(opened.is_open());
        assert_eq!(opened.committed, january());

        let staged = step(&opened, PageAction::Preset(Preset::Today.into()));
        assert_eq!(staged.committed, january());

        let applied = step(&staged, PageAction::Apply);
        assert!(!applied.is_open());
        assert_eq!(
            applied.committed,
            PresetResolver::default().resolve(Preset::Today, test_now())
        );
    }

    #[test]
    fn test_cancel_keeps_committed_range() {
        let opened = step(&closed_state(), PageAction::Trigger);
        let staged = step(&opened, PageAction::Preset(Preset::LastMonth.into()));
        for action in [PageAction::Cancel, PageAction::Backdrop, PageAction::Trigger] {
            let dismissed = step(&staged, action);
            assert_eq!(dismissed, closed_state());
        }
    }

    #[test]
    fn test_day_clicks_keep_the_calendar_in_place() {
        let opened = step(&closed_state(), PageAction::Trigger);
        let paged = step(&step(&opened, PageAction::NextMonth), PageAction::NextMonth);

        let anchored = step(&paged, PageAction::Day(day(3, 4)));
        let finished = step(&anchored, PageAction::Day(day(3, 8)));
        match &finished.popover {
            PopoverUrlState::Open { staging, month } => {
                assert_eq!(month.to_string(), "2024-03");
                assert!(!staging.awaiting_end());
                assert_eq!(staging.staged().start().date_naive(), day(3, 4));
                assert_eq!(staging.staged().end().date_naive(), day(3, 8));
            }
            PopoverUrlState::Closed => panic!("expected open popover"),
        }

        // Future days are not selectable
        assert_eq!(step(&finished, PageAction::Day(day(3, 20))), finished);
    }

    #[test]
    fn test_actions_on_closed_picker_do_nothing() {
        let state = closed_state();
        assert_eq!(step(&state, PageAction::Apply), state);
        assert_eq!(step(&state, PageAction::Day(day(1, 5))), state);
        assert_eq!(step(&state, PageAction::PrevMonth), state);
    }

    fn test_workdir() -> ThreadSafeWorkDir {
        let item = |id: &str, rating: u8, comment: Option<&str>, month: u32, day: u32| FlaggedQuery {
            feedback_id: id.to_string(),
            message_id: format!("msg-{}", id),
            conversation_id: None,
            query: format!("question {}", id),
            response: format!("answer {}", id),
            rating,
            comment: comment.map(str::to_string),
            created_at: New_York
                .with_ymd_and_hms(2024, month, day, 12, 0, 0)
                .single()
                .unwrap()
                .with_timezone(&Utc),
        };
        ThreadSafeWorkDir::new(WorkDir {
            path: PathBuf::from("/tmp/feedback-admin-handler").into_boxed_path(),
            config: Config {
                slug: "acme".to_string(),
                label: "Acme Support Bot".to_string(),
                timezone: "America/New_York".to_string(),
                all_time_start: None,
                default_range_days: 30,
            },
            tz: New_York,
            feedback: FeedbackItems::from(vec![
                item("f1", 0, Some("wrong answer"), 1, 10),
                item("f2", 1, None, 1, 20),
                item("f3", 1, None, 2, 5),
            ]),
            last_seen_modified: 0,
            loaded_at: Utc::now(),
        })
    }

    fn january_query() -> String {
        let (from, to) = january().to_millis();
        format!("from={}&to={}", from, to)
    }

    macro_rules! test_app {
        () => {
            actix_test::init_service(
                App::new().service(
                    web::scope("/acme")
                        .app_data(web::Data::new(test_workdir()))
                        .app_data(web::Data::new(WorkDirPrefix("acme".to_string())))
                        .service(feedback_handler),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_page_lists_matching_feedback() {
        let app = test_app!();
        let req = actix_test::TestRequest::get()
            .uri(&format!("/acme/feedback?rating=negative&{}", january_query()))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).unwrap();

        assert!(body.contains("wrong answer"));
        assert!(!body.contains("question f2"));
        assert!(body.contains("Showing 1 of 3 feedback items"));
        assert!(body.contains("Jan 1, 2024 - Jan 31, 2024"));
        assert!(body.contains("Insights &amp; Actions"));
        assert!(body.contains("<strong>1 negative feedback entries</strong>"));
        assert!(body.contains("<strong>2 positive feedback entries</strong>"));
    }

    #[actix_web::test]
    async fn test_hidden_filters_keep_their_values() {
        let app = test_app!();
        let req = actix_test::TestRequest::get()
            .uri(&format!(
                "/acme/feedback?rating=negative&{}&filters=hidden",
                january_query()
            ))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).unwrap();

        assert!(!body.contains("date-range-picker"));
        assert!(!body.contains("rating_option"));
        assert!(body.contains(">Show</a>"));
        assert!(body.contains("Showing 1 of 3 feedback items"));

        let req = actix_test::TestRequest::get()
            .uri(&format!("/acme/feedback?{}", january_query()))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("date-range-picker"));
        assert!(body.contains("filters=hidden"));
        assert!(body.contains(">Hide</a>"));
    }

    #[actix_web::test]
    async fn test_picker_actions_keep_filters_hidden() {
        let app = test_app!();
        let req = actix_test::TestRequest::get()
            .uri(&format!("/acme/feedback?{}&filters=hidden&action=toggle", january_query()))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        let location = resp.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert!(location.contains("filters=hidden"));
    }

    #[actix_web::test]
    async fn test_page_empty_states() {
        let app = test_app!();
        let (from, to) = DateRange::instant(local_midnight(&New_York, day(3, 1))).to_millis();
        let req = actix_test::TestRequest::get()
            .uri(&format!("/acme/feedback?from={}&to={}", from, to))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("No feedback matching filters"));
        assert!(!body.contains("Insights"));
    }

    #[actix_web::test]
    async fn test_action_redirects_to_next_state() {
        let app = test_app!();
        let req = actix_test::TestRequest::get()
            .uri(&format!("/acme/feedback?{}&action=toggle", january_query()))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("/acme/feedback?rating=all&"));
        assert!(location.contains("open=true"));
        assert!(location.contains("month=2024-01"));
    }

    #[actix_web::test]
    async fn test_malformed_query_is_bad_request() {
        let app = test_app!();
        let last = chrono::DateTime::<Utc>::MAX_UTC.timestamp_millis() - 1000;
        for uri in [
            "/acme/feedback?from=2000&to=1000".to_string(),
            "/acme/feedback?action=explode".to_string(),
            "/acme/feedback?action=escape".to_string(),
            "/acme/feedback?rating=sideways".to_string(),
            "/acme/feedback?filters=sideways".to_string(),
            format!("/acme/feedback?from={}&to={}", last, last),
        ] {
            let req = actix_test::TestRequest::get().uri(&uri).to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }
}
