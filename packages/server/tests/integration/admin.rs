use crate::common::{TestApp, payload, routes};

#[tokio::test]
async fn regular_users_are_forbidden() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice@example.com").await;

    let stats = app.get_with_token(routes::ADMIN_STATS, &token).await;
    assert_eq!(stats.status, 403);
    assert_eq!(stats.body["code"], "PERMISSION_DENIED");

    let files = app.get_with_token(routes::ADMIN_FILES, &token).await;
    assert_eq!(files.status, 403);

    let users = app.get_with_token(routes::ADMIN_USERS, &token).await;
    assert_eq!(users.status, 403);
    assert_eq!(users.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn stats_reflect_deduplication() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root@example.com").await;
    let a = app.create_authenticated_user("a@example.com").await;
    let b = app.create_authenticated_user("b@example.com").await;
    let shared = payload(1, 1000);

    app.upload(&a, "a.bin", shared.clone(), false).await;
    app.upload(&b, "b.bin", shared, false).await;
    let id = app.upload(&b, "c.bin", payload(2, 500), true).await.id();
    app.get_raw(&routes::download(&id), Some(&b), None).await;

    let res = app.get_with_token(routes::ADMIN_STATS, &admin).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total_users"], 3);
    assert_eq!(res.body["total_files"], 3);
    assert_eq!(res.body["unique_contents"], 2);
    assert_eq!(res.body["storage"]["logical_bytes"], 2500);
    assert_eq!(res.body["storage"]["physical_bytes"], 1500);
    assert_eq!(res.body["storage"]["dedup_savings_bytes"], 1000);
    assert_eq!(res.body["storage"]["total_used_bytes"], 1500);
    assert_eq!(res.body["downloads_total"], 1);
    assert_eq!(res.body["downloads_today"], 1);
    assert_eq!(res.body["uploads_today"], 3);
    assert_eq!(res.body["recent_uploads"][0]["name"], "c.bin");
    assert_eq!(res.body["recent_uploads"][0]["owner_email"], "b@example.com");
}

#[tokio::test]
async fn admin_file_listing_includes_owner_and_downloads() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root@example.com").await;
    let a = app.create_authenticated_user("a@example.com").await;

    let id = app.upload(&a, "report.pdf", payload(1, 10), false).await.id();
    app.upload(&a, "photo.png", payload(2, 10), false).await;
    for _ in 0..2 {
        app.get_raw(&routes::download(&id), Some(&a), None).await;
    }

    let res = app
        .get_with_token(&format!("{}?search=REPORT", routes::ADMIN_FILES), &admin)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total"], 1);
    let item = &res.body["files"][0];
    assert_eq!(item["name"], "report.pdf");
    assert_eq!(item["owner_email"], "a@example.com");
    assert_eq!(item["download_count"], 2);

    let all = app.get_with_token(routes::ADMIN_FILES, &admin).await;
    assert_eq!(all.body["total"], 2);
}

#[tokio::test]
async fn admin_user_listing_reports_real_usage() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root@example.com").await;
    let a = app.create_authenticated_user("alice@example.com").await;
    let b = app.create_authenticated_user("bob@example.com").await;
    app.set_quota("alice@example.com", 5000, 0).await;

    let shared = payload(1, 100);
    let id = app.upload(&a, "open.bin", shared.clone(), true).await.id();
    app.upload(&a, "own.bin", payload(2, 200), false).await;
    app.upload(&b, "copy.bin", shared, false).await;
    app.get_raw(&routes::download(&id), Some(&a), None).await;
    app.get_raw(&routes::download(&id), Some(&b), None).await;

    let res = app
        .get_with_token(&format!("{}?search=ALICE", routes::ADMIN_USERS), &admin)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total"], 1);
    let alice = &res.body["users"][0];
    assert_eq!(alice["email"], "alice@example.com");
    assert_eq!(alice["role"], "user");
    assert_eq!(alice["storage_quota"], 5000);
    assert_eq!(alice["storage_used"], 300);
    assert_eq!(alice["file_count"], 2);
    assert_eq!(alice["download_count"], 2);
    assert!(alice.get("password_hash").is_none());

    let bob = app
        .get_with_token(&format!("{}?search=bob", routes::ADMIN_USERS), &admin)
        .await;
    assert_eq!(bob.body["users"][0]["storage_used"], 0);
    assert_eq!(bob.body["users"][0]["file_count"], 1);
    assert_eq!(bob.body["users"][0]["download_count"], 0);

    let page = app
        .get_with_token(&format!("{}?page=2&page_size=2", routes::ADMIN_USERS), &admin)
        .await;
    assert_eq!(page.body["total"], 3);
    assert_eq!(page.body["users"].as_array().unwrap().len(), 1);
}
