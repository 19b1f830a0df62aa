//! Scraper Integration Tests
//!
//! Runs scrape cycles against a real database and feeds served over HTTP.

use std::sync::Arc;

use rssagg::config::ScraperConfig;
use rssagg::rss::{FeedRepository, NewFeed, PostRepository, RssFetcher, Scheduler};
use rssagg::{Database, NewUser, User, UserRepository};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GOOD_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Good Blog</title>
    <link>https://good.example.com</link>
    <description>Posts that parse</description>
    <item>
      <title>First post</title>
      <link>https://good.example.com/first</link>
      <description>Hello</description>
      <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Second post</title>
      <link>https://good.example.com/second</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

async fn setup() -> (Database, User, MockServer) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let user = UserRepository::new(db.pool())
        .create(&NewUser::new("Lane"))
        .await
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GOOD_RSS))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbage.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not a feed"))
        .mount(&server)
        .await;

    (db, user, server)
}

fn scheduler(db: &Database) -> Scheduler {
    let config = ScraperConfig {
        request_timeout_secs: 5,
        ..ScraperConfig::default()
    };
    let fetcher = RssFetcher::new(&config).unwrap();
    Scheduler::new(Arc::new(db.clone()), Arc::new(fetcher))
}

async fn add_feed(db: &Database, user: &User, server: &MockServer, name: &str) -> uuid::Uuid {
    FeedRepository::new(db.pool())
        .create(&NewFeed::new(
            name,
            format!("{}/{}.xml", server.uri(), name),
            user.id,
        ))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_cycle_isolates_failing_feeds() {
    let (db, user, server) = setup().await;
    let good = add_feed(&db, &user, &server, "good").await;
    let broken = add_feed(&db, &user, &server, "broken").await;
    let garbage = add_feed(&db, &user, &server, "garbage").await;

    let report = scheduler(&db).run_cycle(10).await.unwrap();

    assert_eq!(report.selected, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.posts_inserted, 2);

    // Every selected feed is stamped, whether or not its fetch worked.
    let feeds = FeedRepository::new(db.pool());
    for id in [good, broken, garbage] {
        let feed = feeds.get_by_id(id).await.unwrap().unwrap();
        assert!(feed.last_fetched_at.is_some(), "feed {} not stamped", feed.name);
    }

    let posts = PostRepository::new(db.pool());
    assert_eq!(posts.count_by_feed(good).await.unwrap(), 2);
    assert_eq!(posts.count_by_feed(broken).await.unwrap(), 0);
    assert_eq!(posts.count_by_feed(garbage).await.unwrap(), 0);
}

#[tokio::test]
async fn test_repeated_cycles_do_not_duplicate_posts() {
    let (db, user, server) = setup().await;
    let good = add_feed(&db, &user, &server, "good").await;
    let scheduler = scheduler(&db);

    let first = scheduler.run_cycle(10).await.unwrap();
    let second = scheduler.run_cycle(10).await.unwrap();

    assert_eq!(first.posts_inserted, 2);
    assert_eq!(second.succeeded, 1);
    assert_eq!(second.posts_inserted, 0);
    assert_eq!(
        PostRepository::new(db.pool()).count_by_feed(good).await.unwrap(),
        2
    );

    let posts = PostRepository::new(db.pool())
        .list_for_user(user.id, 10)
        .await
        .unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Second post", "First post"]);
    assert_eq!(posts[1].description.as_deref(), Some("Hello"));
    assert_eq!(posts[0].description, None);
}

#[tokio::test]
async fn test_batches_rotate_through_stalest_feeds() {
    let (db, user, server) = setup().await;
    let good = add_feed(&db, &user, &server, "good").await;
    let broken = add_feed(&db, &user, &server, "broken").await;
    let garbage = add_feed(&db, &user, &server, "garbage").await;
    let scheduler = scheduler(&db);
    let feeds = FeedRepository::new(db.pool());

    let first = scheduler.run_cycle(2).await.unwrap();
    assert_eq!(first.selected, 2);
    assert!(feeds.get_by_id(good).await.unwrap().unwrap().last_fetched_at.is_some());
    assert!(feeds.get_by_id(broken).await.unwrap().unwrap().last_fetched_at.is_some());
    assert!(feeds.get_by_id(garbage).await.unwrap().unwrap().last_fetched_at.is_none());

    let next: Vec<_> = feeds
        .next_to_fetch(2)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(next[0], garbage);

    scheduler.run_cycle(2).await.unwrap();
    assert!(feeds.get_by_id(garbage).await.unwrap().unwrap().last_fetched_at.is_some());
}

#[tokio::test]
async fn test_unreachable_feed_is_stamped() {
    let (db, user, _server) = setup().await;

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let id = FeedRepository::new(db.pool())
        .create(&NewFeed::new("gone", format!("http://{}/rss", addr), user.id))
        .await
        .unwrap()
        .id;

    let report = scheduler(&db).run_cycle(10).await.unwrap();

    assert_eq!(report.failed, 1);
    let feed = FeedRepository::new(db.pool())
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert!(feed.last_fetched_at.is_some());
}
