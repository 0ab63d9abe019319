use crate::common::{TestApp, payload, routes, sha256_hex};

mod listing {
    use super::*;

    #[tokio::test]
    async fn lists_only_own_files_newest_first() {
        let app = TestApp::spawn().await;
        let a = app.create_authenticated_user("a@example.com").await;
        let b = app.create_authenticated_user("b@example.com").await;

        app.upload(&a, "first.txt", payload(1, 10), false).await;
        app.upload(&a, "second.txt", payload(2, 10), false).await;
        app.upload(&b, "other.txt", payload(3, 10), false).await;

        let res = app.get_with_token(routes::FILES, &a).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        assert_eq!(res.body["page"], 1);
        assert_eq!(res.body["page_size"], 20);
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files[0]["name"], "second.txt");
        assert_eq!(files[1]["name"], "first.txt");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_escapes_wildcards() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;

        app.upload(&token, "Quarterly_Report.pdf", payload(1, 10), false).await;
        app.upload(&token, "QuarterlyXReport.pdf", payload(2, 10), false).await;
        app.upload(&token, "holiday.jpg", payload(3, 10), false).await;

        let res = app
            .get_with_token(&format!("{}?search=quarterly_", routes::FILES), &token)
            .await;

        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["files"][0]["name"], "Quarterly_Report.pdf");
    }

    #[tokio::test]
    async fn filters_by_visibility_and_paginates() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;

        for i in 0..5u8 {
            app.upload(&token, &format!("f{i}.txt"), payload(i, 10), i % 2 == 0)
                .await;
        }

        let public = app
            .get_with_token(&format!("{}?is_public=true", routes::FILES), &token)
            .await;
        assert_eq!(public.body["total"], 3);

        let page = app
            .get_with_token(&format!("{}?page=2&page_size=2", routes::FILES), &token)
            .await;
        assert_eq!(page.body["total"], 5);
        assert_eq!(page.body["page"], 2);
        assert_eq!(page.body["files"].as_array().unwrap().len(), 2);

        let capped = app
            .get_with_token(&format!("{}?page_size=1000", routes::FILES), &token)
            .await;
        assert_eq!(capped.body["page_size"], 100);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn private_file_is_forbidden_to_others() {
        let app = TestApp::spawn().await;
        let a = app.create_authenticated_user("a@example.com").await;
        let b = app.create_authenticated_user("b@example.com").await;
        let id = app.upload(&a, "secret.txt", payload(1, 10), false).await.id();

        assert_eq!(app.get_with_token(&routes::file(&id), &a).await.status, 200);

        let res = app.get_with_token(&routes::file(&id), &b).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let dl = app.get_raw(&routes::download(&id), Some(&b), None).await;
        assert_eq!(dl.status, 403);
    }

    #[tokio::test]
    async fn public_file_is_readable_by_others() {
        let app = TestApp::spawn().await;
        let a = app.create_authenticated_user("a@example.com").await;
        let b = app.create_authenticated_user("b@example.com").await;
        let id = app.upload(&a, "open.txt", payload(1, 10), true).await.id();

        let res = app.get_with_token(&routes::file(&id), &b).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "open.txt");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;

        let missing = app
            .get_with_token(&routes::file("0192f3c1-4be0-7000-8000-000000000000"), &token)
            .await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body["code"], "NOT_FOUND");

        let bad = app.get_with_token(&routes::file("not-a-uuid"), &token).await;
        assert_eq!(bad.status, 400);
    }

    #[tokio::test]
    async fn only_owner_can_delete() {
        let app = TestApp::spawn().await;
        let a = app.create_authenticated_user("a@example.com").await;
        let b = app.create_authenticated_user("b@example.com").await;
        let id = app.upload(&a, "mine.txt", payload(1, 10), true).await.id();

        let res = app.delete_with_token(&routes::file(&id), &b).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::file(&id), &a).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "file deleted");

        let res = app.get_with_token(&routes::file(&id), &a).await;
        assert_eq!(res.status, 404);
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn streams_bytes_with_headers() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;
        let bytes = payload(1, 10_000);
        let id = app.upload(&token, "data.txt", bytes.clone(), false).await.id();

        let res = app.get_raw(&routes::download(&id), Some(&token), None).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, bytes);
        assert_eq!(res.headers["content-type"], "text/plain");
        assert_eq!(res.headers["content-length"], "10000");
        assert_eq!(
            res.headers["etag"].to_str().unwrap(),
            format!("\"{}\"", sha256_hex(&bytes))
        );
        assert!(
            res.headers["content-disposition"]
                .to_str()
                .unwrap()
                .contains("filename=\"data.txt\"")
        );
    }

    #[tokio::test]
    async fn matching_etag_yields_not_modified() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;
        let bytes = payload(2, 100);
        let id = app.upload(&token, "data.txt", bytes.clone(), false).await.id();
        let etag = format!("\"{}\"", sha256_hex(&bytes));

        let res = app
            .get_raw(&routes::download(&id), Some(&token), Some(&etag))
            .await;

        assert_eq!(res.status, 304);
        assert!(res.bytes.is_empty());
    }

    #[tokio::test]
    async fn deleting_one_reference_keeps_shared_content() {
        let app = TestApp::spawn().await;
        let a = app.create_authenticated_user("a@example.com").await;
        let b = app.create_authenticated_user("b@example.com").await;
        let bytes = payload(3, 2048);

        let fa = app.upload(&a, "a.bin", bytes.clone(), false).await.id();
        let fb = app.upload(&b, "b.bin", bytes.clone(), false).await.id();

        assert_eq!(app.delete_with_token(&routes::file(&fa), &a).await.status, 200);

        assert_eq!(app.content_count().await, 1);
        let res = app.get_raw(&routes::download(&fb), Some(&b), None).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, bytes);
    }

    #[tokio::test]
    async fn missing_bytes_are_reported_distinctly() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;
        let bytes = payload(4, 64);
        let hash = sha256_hex(&bytes);
        let id = app.upload(&token, "gone.bin", bytes, false).await.id();

        std::fs::remove_file(app.storage.path().join(&hash[..2]).join(&hash)).unwrap();

        let res = app.get_with_token(&routes::download(&id), &token).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "CONTENT_MISSING");
    }

    #[tokio::test]
    async fn conditional_download_is_answered_from_the_registry() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;
        let bytes = payload(8, 64);
        let hash = sha256_hex(&bytes);
        let id = app.upload(&token, "cached.bin", bytes, false).await.id();

        std::fs::remove_file(app.storage.path().join(&hash[..2]).join(&hash)).unwrap();

        let etag = format!("\"{hash}\"");
        let res = app
            .get_raw(&routes::download(&id), Some(&token), Some(&etag))
            .await;
        assert_eq!(res.status, 304);
    }

    #[tokio::test]
    async fn reupload_of_lost_content_only_adds_a_reference() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@example.com").await;
        let bytes = payload(5, 64);
        let hash = sha256_hex(&bytes);
        let id = app.upload(&token, "x.bin", bytes.clone(), false).await.id();
        std::fs::remove_file(app.storage.path().join(&hash[..2]).join(&hash)).unwrap();

        // The registry still knows the hash, so this is a pure reference add.
        let res = app.upload(&token, "y.bin", bytes, false).await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["deduplicated"], true);

        let dl = app.get_with_token(&routes::download(&id), &token).await;
        assert_eq!(dl.body["code"], "CONTENT_MISSING");
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::HEALTH).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");
    }

    #[tokio::test]
    async fn rate_limited_clients_get_429() {
        let app = TestApp::spawn_with_rate_limit(0.01, 2).await;

        for _ in 0..2 {
            let res = app.get_without_token(routes::FILES).await;
            assert_eq!(res.status, 401);
        }

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::FILES))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 429);
        assert!(res.headers().contains_key("retry-after"));

        // Health is outside the limited API tree.
        assert_eq!(app.get_without_token(routes::HEALTH).await.status, 200);
    }

    #[tokio::test]
    async fn forged_forwarded_for_does_not_reset_the_limit() {
        let app = TestApp::spawn_with_rate_limit(0.01, 2).await;

        let mut statuses = Vec::new();
        for i in 0..4 {
            let res = app
                .client
                .get(format!("http://{}{}", app.addr, routes::FILES))
                .header("X-Forwarded-For", format!("198.51.100.{i}"))
                .send()
                .await
                .unwrap();
            statuses.push(res.status().as_u16());
        }

        assert_eq!(statuses, vec![401, 401, 429, 429]);
    }
}
