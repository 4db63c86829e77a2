//! Fetch pipeline integration tests.
//!
//! Drives subscription and sync through a scripted content source and checks
//! what ends up in the store and in the published feed.

mod common;

use common::{test_config, upstream_article, TestApp};

use oarss::store::{AccountRepository, NewAccount};
use oarss::{
    ArticleQuery, ArticleRepository, ChannelRepository, ChannelStatus, ErrorKind, FeedFormat,
    FeedScope, OarssError,
};

const BIZ: &str = "Mzkz123abc";

async fn subscribed_app() -> TestApp {
    let app = TestApp::new(test_config()).await;
    app.source.add_channel(BIZ, "Daily Notes");
    app.source.set_articles(
        BIZ,
        vec![
            upstream_article("https://mp.example.com/s/1", "First", "<p>one</p>", 1),
            upstream_article("https://mp.example.com/s/2", "Second", "<p>two</p>", 2),
        ],
    );
    app
}

// ============================================================================
// Subscribing
// ============================================================================

#[tokio::test]
async fn test_add_channel_end_to_end() {
    let app = subscribed_app().await;

    let link = app.pipeline.add_channel(BIZ).await.unwrap();
    assert_eq!(link, "http://rss.test/feed/Mzkz123abc");

    app.settle().await;
    assert_eq!(app.pipeline.tasks().spawned(), 1);

    let channels = ChannelRepository::new(app.db.pool()).list_all().await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].real_id, BIZ);
    assert_eq!(channels[0].name, "Daily Notes");
    assert_eq!(channels[0].article_count, 2);
    assert!(channels[0].last_update.is_some());

    let doc = app
        .state
        .synthesizer
        .build_document(&FeedScope::Channel(BIZ.to_string()), FeedFormat::Rss)
        .await
        .unwrap();
    assert_eq!(doc.title, "Daily Notes");
    assert_eq!(doc.entries.len(), 2);
    assert_eq!(doc.entries[0].title, "Second");
}

#[tokio::test]
async fn test_add_existing_channel_only_syncs() {
    let app = subscribed_app().await;

    app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;
    let link = app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    assert_eq!(link, "http://rss.test/feed/Mzkz123abc");
    assert_eq!(app.source.metadata_calls(), 1);
    assert_eq!(app.pipeline.tasks().spawned(), 2);
    assert_eq!(
        ChannelRepository::new(app.db.pool())
            .list_all()
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_add_channel_unknown_to_provider() {
    let app = TestApp::new(test_config()).await;

    let err = app.pipeline.add_channel("MzUnknown").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert!(ChannelRepository::new(app.db.pool())
        .list_all()
        .await
        .unwrap()
        .is_empty());
    assert_eq!(app.pipeline.tasks().spawned(), 0);
}

#[tokio::test]
async fn test_add_channel_empty_id() {
    let app = TestApp::new(test_config()).await;
    let err = app.pipeline.add_channel("  ").await.unwrap_err();
    assert!(matches!(err, OarssError::Validation(_)));
}

#[tokio::test]
async fn test_add_channel_attaches_available_account() {
    let app = subscribed_app().await;
    let accounts = AccountRepository::new(app.db.pool());
    let account = accounts
        .create(&NewAccount::new("reader", "cookie=1", "tok"))
        .await
        .unwrap();

    app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    let channel = ChannelRepository::new(app.db.pool())
        .get_by_real_id(BIZ)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(channel.account_id, Some(account.id));
}

#[tokio::test]
async fn test_add_channel_by_url_query_parameter() {
    let app = subscribed_app().await;

    let link = app
        .pipeline
        .add_channel_by_url("https://mp.example.com/s?__biz=Mzkz123abc&mid=1")
        .await
        .unwrap();
    app.settle().await;

    assert_eq!(link, "http://rss.test/feed/Mzkz123abc");
    assert!(ChannelRepository::new(app.db.pool())
        .get_by_real_id(BIZ)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_add_channel_by_url_markup() {
    let app = subscribed_app().await;
    let url = "https://mp.example.com/s/AbCdEf";
    app.source
        .set_page(url, r#"<script>var biz = "Mzkz123abc";</script>"#);

    let link = app.pipeline.add_channel_by_url(url).await.unwrap();
    app.settle().await;

    assert_eq!(link, "http://rss.test/feed/Mzkz123abc");
}

#[tokio::test]
async fn test_add_channel_by_url_without_identifier() {
    let app = subscribed_app().await;
    let url = "https://mp.example.com/s/plain";
    app.source.set_page(url, "<html><body>nothing</body></html>");

    let err = app.pipeline.add_channel_by_url(url).await.unwrap_err();
    assert!(matches!(err, OarssError::IdentifierNotFound(_)));
    assert!(ChannelRepository::new(app.db.pool())
        .list_all()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_add_channel_by_invalid_url() {
    let app = TestApp::new(test_config()).await;
    let err = app
        .pipeline
        .add_channel_by_url("not a url")
        .await
        .unwrap_err();
    assert!(matches!(err, OarssError::Validation(_)));
}

#[tokio::test]
async fn test_feed_link_uses_token_when_enabled() {
    let mut config = test_config();
    config.rss.enc_feed_id = true;
    config.rss.secret = "s3cret".to_string();
    let app = TestApp::new(config).await;
    app.source.add_channel(BIZ, "Daily Notes");

    let link = app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    let token = app.pipeline.codec().encode(BIZ);
    assert_eq!(link, format!("http://rss.test/feed/{token}"));
    assert!(!link.contains(BIZ));
}

// ============================================================================
// Syncing
// ============================================================================

#[tokio::test]
async fn test_sync_is_idempotent() {
    let app = subscribed_app().await;
    app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    let report = app.pipeline.sync_channel(BIZ).await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.created, 0);
    assert_eq!(report.skipped, 2);

    let articles = ArticleRepository::new(app.db.pool());
    assert_eq!(articles.count_by_channel(BIZ).await.unwrap(), 2);
}

#[tokio::test]
async fn test_sync_picks_up_new_articles() {
    let app = subscribed_app().await;
    app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    app.source.set_articles(
        BIZ,
        vec![
            upstream_article("https://mp.example.com/s/3", "Third", "<p>three</p>", 3),
            upstream_article("https://mp.example.com/s/2", "Second", "<p>two</p>", 2),
        ],
    );
    let report = app.pipeline.sync_channel(BIZ).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 1);

    let channel = ChannelRepository::new(app.db.pool())
        .get_by_real_id(BIZ)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(channel.article_count, 3);
}

#[tokio::test]
async fn test_sync_backfills_empty_body() {
    let app = subscribed_app().await;
    app.source.set_articles(
        BIZ,
        vec![
            upstream_article("https://mp.example.com/s/1", "With body", "<p>one</p>", 1),
            upstream_article("https://mp.example.com/s/2", "No body", "", 2),
            upstream_article("https://mp.example.com/s/3", "Body unavailable", "", 3),
        ],
    );
    app.source
        .set_body("https://mp.example.com/s/2", "<p>fetched</p>");

    ChannelRepository::new(app.db.pool())
        .create(&oarss::NewChannel::new(BIZ, "Daily Notes"))
        .await
        .unwrap();
    let report = app.pipeline.sync_channel(BIZ).await.unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(report.backfilled, 1);
    assert_eq!(app.source.body_calls(), 2);

    let (articles, _) = ArticleRepository::new(app.db.pool())
        .query(&ArticleQuery {
            include_body: true,
            ..ArticleQuery::latest(Some(BIZ), 10)
        })
        .await
        .unwrap();
    let body_of = |title: &str| {
        articles
            .iter()
            .find(|a| a.title == title)
            .map(|a| a.content.clone())
            .unwrap()
    };
    assert_eq!(body_of("No body"), "<p>fetched</p>");
    assert_eq!(body_of("Body unavailable"), "");
    assert_eq!(body_of("With body"), "<p>one</p>");
}

#[tokio::test]
async fn test_resync_skips_body_fetch_for_stored_links() {
    let app = subscribed_app().await;
    app.source.set_articles(
        BIZ,
        vec![
            upstream_article("https://mp.example.com/s/1", "No body", "", 1),
            upstream_article("https://mp.example.com/s/2", "Also no body", "", 2),
        ],
    );
    app.source
        .set_body("https://mp.example.com/s/1", "<p>fetched</p>");
    ChannelRepository::new(app.db.pool())
        .create(&oarss::NewChannel::new(BIZ, "Daily Notes"))
        .await
        .unwrap();

    let first = app.pipeline.sync_channel(BIZ).await.unwrap();
    assert_eq!(first.created, 2);
    assert_eq!(app.source.body_calls(), 2);

    let second = app.pipeline.sync_channel(BIZ).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.backfilled, 0);
    assert_eq!(app.source.body_calls(), 2);
}

#[tokio::test]
async fn test_sync_unknown_channel() {
    let app = TestApp::new(test_config()).await;
    let err = app.pipeline.sync_channel("MzMissing").await.unwrap_err();
    assert!(matches!(err, OarssError::ChannelNotFound(_)));
    assert_eq!(app.source.page_calls(), 0);
}

#[tokio::test]
async fn test_sync_all_skips_paused_and_survives_failures() {
    let app = TestApp::new(test_config()).await;
    for (id, name) in [("MzA", "A"), ("MzB", "B"), ("MzC", "C")] {
        app.source.add_channel(id, name);
        app.source.set_articles(
            id,
            vec![upstream_article(
                &format!("https://mp.example.com/{id}/1"),
                name,
                "<p>x</p>",
                1,
            )],
        );
        ChannelRepository::new(app.db.pool())
            .create(&oarss::NewChannel::new(id, name))
            .await
            .unwrap();
    }
    app.source.fail_pages_for("MzB");
    app.pipeline.set_paused("MzC", true).await.unwrap();

    let summary = app.pipeline.sync_all().await.unwrap();
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.created, 1);

    let articles = ArticleRepository::new(app.db.pool());
    assert_eq!(articles.count_by_channel("MzA").await.unwrap(), 1);
    assert_eq!(articles.count_by_channel("MzB").await.unwrap(), 0);
    assert_eq!(articles.count_by_channel("MzC").await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_syncs_do_not_duplicate() {
    let app = subscribed_app().await;
    ChannelRepository::new(app.db.pool())
        .create(&oarss::NewChannel::new(BIZ, "Daily Notes"))
        .await
        .unwrap();

    for _ in 0..4 {
        app.pipeline.spawn_sync(BIZ);
    }
    app.settle().await;

    assert_eq!(app.pipeline.tasks().completed(), 4);
    assert_eq!(
        ArticleRepository::new(app.db.pool())
            .count_by_channel(BIZ)
            .await
            .unwrap(),
        2
    );
}

// ============================================================================
// Pausing and deleting
// ============================================================================

#[tokio::test]
async fn test_pause_and_resume() {
    let app = subscribed_app().await;
    app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    app.pipeline.set_paused(BIZ, true).await.unwrap();
    let channels = ChannelRepository::new(app.db.pool());
    let channel = channels.get_by_real_id(BIZ).await.unwrap().unwrap();
    assert_eq!(channel.status, ChannelStatus::Paused);
    assert!(channels.list_active().await.unwrap().is_empty());

    app.pipeline.set_paused(BIZ, false).await.unwrap();
    let channel = channels.get_by_real_id(BIZ).await.unwrap().unwrap();
    assert_eq!(channel.status, ChannelStatus::Active);
}

#[tokio::test]
async fn test_delete_channel_removes_articles() {
    let app = subscribed_app().await;
    app.pipeline.add_channel(BIZ).await.unwrap();
    app.settle().await;

    app.pipeline.delete_channel(BIZ).await.unwrap();

    assert!(ChannelRepository::new(app.db.pool())
        .get_by_real_id(BIZ)
        .await
        .unwrap()
        .is_none());
    let (articles, total) = ArticleRepository::new(app.db.pool())
        .query(&ArticleQuery::latest(None, 10))
        .await
        .unwrap();
    assert!(articles.is_empty());
    assert_eq!(total, 0);
}
