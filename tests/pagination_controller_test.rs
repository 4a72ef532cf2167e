mod common;

use common::{listing_page, show_item, test_config, ScriptedSession};
use setlist_harvest::pipeline::controller::{CrawlSummary, PaginationController};
use setlist_harvest::pipeline::location::LocationResolver;
use setlist_harvest::pipeline::pagination::TerminationReason;
use setlist_harvest::types::Collection;
use std::collections::HashSet;

const START_URL: &str = "https://setlist.test/attended/fan";

fn first_three() -> Vec<String> {
    vec![
        show_item("Mar", "7", "2024", "Krisiun", "Tork n' Roll, Curitiba, Brazil"),
        show_item("Nov", "12", "2023", "Angra", "Espaço Unimed, São Paulo, Brazil"),
        show_item("Aug", "3", "2023", "Sepultura", "Bangers Open Air"),
    ]
}

async fn crawl(session: &mut ScriptedSession) -> (CrawlSummary, Collection) {
    let config = test_config();
    let resolver = LocationResolver::default();
    let controller = PaginationController::new(&config.crawl, &resolver);
    let mut collection = Collection::new();
    let summary = controller.crawl(session, START_URL, &mut collection).await;
    (summary, collection)
}

#[tokio::test]
async fn test_overlapping_pages_are_merged_until_next_control_disappears() {
    let page_one = listing_page("", &first_three());
    let mut second = first_three();
    second.push(show_item("Jan", "5", "2023", "Ratos de Porão", "Opinião, Porto Alegre, Brazil"));
    let page_two = listing_page("", &second);

    let mut session = ScriptedSession::with_pages(vec![page_one, page_two]);
    let log = session.log();
    let (summary, collection) = crawl(&mut session).await;

    assert_eq!(summary.termination, TerminationReason::NoMorePages);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(collection.len(), 4);

    let identities: HashSet<_> = collection.records().iter().map(|r| r.identity()).collect();
    assert_eq!(identities.len(), collection.len());

    let log = log.lock().unwrap();
    assert_eq!(log.navigations, vec![START_URL.to_string()]);
    assert_eq!(log.activations, 1);
}

#[tokio::test]
async fn test_stops_when_announced_total_is_reached() {
    let mut items = first_three();
    items.push(show_item("Jan", "5", "2023", "Ratos de Porão", "Opinião"));
    let page_one = listing_page("<span>4 Attended</span>", &items);
    let page_two = listing_page("", &[show_item("Feb", "1", "2022", "Viper", "Opinião")]);

    let mut session = ScriptedSession::with_pages(vec![page_one, page_two]);
    let log = session.log();
    let (summary, collection) = crawl(&mut session).await;

    assert_eq!(summary.termination, TerminationReason::TargetReached);
    assert_eq!(summary.expected_total, Some(4));
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(collection.len(), 4);
    assert_eq!(log.lock().unwrap().activations, 0);
}

#[tokio::test]
async fn test_identical_pages_forever_end_in_stagnation() {
    let page = listing_page("", &first_three());
    let mut session = ScriptedSession::from_fn(move |_| Some(page.clone()));
    let (summary, collection) = crawl(&mut session).await;

    assert_eq!(summary.termination, TerminationReason::Stagnation);
    assert_eq!(summary.pages_visited, 4);
    assert_eq!(collection.len(), 3);
}

#[tokio::test]
async fn test_endless_new_content_stops_at_page_ceiling() {
    let mut session = ScriptedSession::from_fn(|index| {
        let artist = format!("Band {}", index);
        Some(listing_page("", &[show_item("Jun", "1", "2020", &artist, "Opinião")]))
    });
    let log = session.log();
    let (summary, collection) = crawl(&mut session).await;

    assert_eq!(summary.termination, TerminationReason::SafetyLimit);
    assert_eq!(summary.pages_visited, 50);
    assert_eq!(collection.len(), 50);
    assert_eq!(log.lock().unwrap().activations, 49);
}

#[tokio::test]
async fn test_page_load_timeout_still_extracts() {
    let mut session = ScriptedSession::with_pages(vec![listing_page("", &first_three())]);
    session.wait_times_out = true;
    let (summary, collection) = crawl(&mut session).await;

    assert_eq!(summary.termination, TerminationReason::NoMorePages);
    assert_eq!(collection.len(), 3);
}

#[tokio::test]
async fn test_failed_click_on_next_control_ends_crawl() {
    let pages = vec![
        listing_page("", &first_three()),
        listing_page("", &[show_item("Feb", "1", "2022", "Viper", "Opinião")]),
    ];
    let mut session = ScriptedSession::with_pages(pages);
    session.activate_fails = true;
    let log = session.log();
    let (summary, collection) = crawl(&mut session).await;

    assert_eq!(summary.termination, TerminationReason::NoMorePages);
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(collection.len(), 3);
    assert_eq!(log.lock().unwrap().activations, 0);
}

#[tokio::test]
async fn test_browser_failure_keeps_records_from_earlier_pages() {
    let pages = vec![
        listing_page("", &first_three()),
        listing_page("", &[show_item("Feb", "1", "2022", "Viper", "Opinião")]),
    ];
    let mut session = ScriptedSession::with_pages(pages);
    session.fail_markup_on = Some(1);
    let (summary, collection) = crawl(&mut session).await;

    assert!(matches!(summary.termination, TerminationReason::Aborted(_)));
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(collection.len(), 3);
}

#[tokio::test]
async fn test_upcoming_entries_never_reach_collection() {
    let upcoming = r#"<li class="setlist"><span class="label">Upcoming</span>
        <div class="column content"><strong>Viper</strong>
        <span class="subline"><span>Opinião</span></span></div></li>"#
        .to_string();
    let mut items = first_three();
    items.push(upcoming);

    let mut session = ScriptedSession::with_pages(vec![listing_page("", &items)]);
    let (_, collection) = crawl(&mut session).await;

    assert_eq!(collection.len(), 3);
    assert!(collection.records().iter().all(|r| r.artist != "Viper"));
}
