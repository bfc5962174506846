use serde_json::json;

use crate::common::{POST, SITE, TestApp, comment_params, post};

mod create {
    use super::*;

    #[tokio::test]
    async fn create_returns_new_id_with_signature() {
        let app = TestApp::spawn_with_auth().await;

        let res = app
            .post_envelope(&json!({
                "method": "store.create",
                "id": 1,
                "params": comment_params("user1", "first!", ""),
            }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], 1);
        assert!(res.body["result"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(res.body.get("error").is_none());
        assert_eq!(res.body["sig"]["name"], "memstore");
        assert_eq!(res.body["sig"]["author"], "memstore");
        assert!(res.body["sig"]["version"].is_string());
    }

    #[tokio::test]
    async fn replayed_create_returns_same_id_and_stores_once() {
        let app = TestApp::spawn_with_auth().await;
        let envelope = json!({
            "method": "store.create",
            "id": 1,
            "params": comment_params("user1", "first!", ""),
        });

        let first = app.post_envelope(&envelope).await;
        let second = app.post_envelope(&envelope).await;

        assert_eq!(first.result(), second.result());
        assert_eq!(second.body["id"], 1);
        let count = app.rpc("store.count", post()).await;
        assert_eq!(count.result(), &json!(1));
    }

    #[tokio::test]
    async fn read_only_post_rejects_create() {
        let app = TestApp::spawn().await;

        let res = app
            .rpc(
                "store.set_read_only",
                json!({"site": SITE, "url": POST, "read_only": true}),
            )
            .await;
        assert_eq!(res.result(), &json!(null));

        let res = app
            .rpc("store.create", comment_params("user1", "too late", ""))
            .await;
        assert_eq!(res.error(), "post is read-only");
        assert!(res.body.get("result").is_none());

        let count = app.rpc("store.count", post()).await;
        assert_eq!(count.result(), &json!(0));
        let flag = app.rpc("store.is_read_only", post()).await;
        assert_eq!(flag.result(), &json!(true));
    }

    #[tokio::test]
    async fn reply_to_missing_parent_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .rpc("store.create", comment_params("user1", "hi", "nope"))
            .await;

        assert_eq!(res.error(), "parent comment nope not found");
    }

    #[tokio::test]
    async fn blocked_user_cannot_comment() {
        let app = TestApp::spawn().await;
        app.rpc(
            "store.set_blocked",
            json!({"site": SITE, "user_id": "troll", "blocked": true, "ttl": 3600}),
        )
        .await
        .result();

        let res = app
            .rpc("store.create", comment_params("troll", "spam", ""))
            .await;
        assert_eq!(res.error(), "user is blocked");

        let blocked = app.rpc("store.blocked", json!({"site": SITE})).await;
        assert_eq!(blocked.result()[0]["user_id"], "troll");
        let flag = app
            .rpc("store.is_blocked", json!({"site": SITE, "user_id": "troll"}))
            .await;
        assert_eq!(flag.result(), &json!(true));
    }
}

mod reads {
    use super::*;

    #[tokio::test]
    async fn get_returns_stored_comment() {
        let app = TestApp::spawn().await;
        let id = app.create_comment("user1", "hello").await;

        let res = app.rpc("store.get", json!({"site": SITE, "id": id})).await;

        let comment = res.result();
        assert_eq!(comment["id"], id.as_str());
        assert_eq!(comment["text"], "hello");
        assert_eq!(comment["user"]["id"], "user1");
        assert_eq!(comment["locator"]["url"], POST);
        assert_eq!(comment["deleted"], false);
    }

    #[tokio::test]
    async fn find_sorts_and_tree_nests() {
        let app = TestApp::spawn().await;
        let root = app.create_comment("user1", "root").await;
        let reply = app
            .rpc("store.create", comment_params("user2", "reply", &root))
            .await
            .result()
            .as_str()
            .unwrap()
            .to_string();
        let other = app.create_comment("user3", "another root").await;

        let res = app
            .rpc("store.find", json!({"site": SITE, "url": POST, "sort": "-time"}))
            .await;
        let ids: Vec<&str> = res
            .result()
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, [other.as_str(), reply.as_str(), root.as_str()]);

        let res = app.rpc("store.tree", post()).await;
        let forest = res.result().as_array().unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0]["comment"]["id"], root.as_str());
        assert_eq!(forest[0]["replies"][0]["comment"]["id"], reply.as_str());
        assert!(forest[0]["fingerprint"].is_string());
        assert_ne!(forest[0]["fingerprint"], forest[1]["fingerprint"]);
    }

    #[tokio::test]
    async fn deep_reply_chain_keeps_serving() {
        let app = TestApp::spawn().await;
        let mut parent = String::new();
        for i in 0..200 {
            let res = app
                .rpc("store.create", comment_params("user1", &format!("reply {i}"), &parent))
                .await;
            parent = res.result().as_str().unwrap().to_string();
        }

        let res = app.rpc("store.tree", post()).await;
        let forest = res.result().as_array().unwrap();
        assert_eq!(forest.len(), 1);

        let mut node = &forest[0];
        let mut depth = 0;
        while let Some(reply) = node["replies"].as_array().and_then(|r| r.first()) {
            node = reply;
            depth += 1;
        }
        assert_eq!(depth, ::common::tree::MAX_DEPTH);

        let res = app.rpc("store.count", post()).await;
        assert_eq!(res.result(), &json!(200));
    }

    #[tokio::test]
    async fn last_user_and_info() {
        let app = TestApp::spawn().await;
        app.create_comment("user1", "one").await;
        app.create_comment("user2", "two").await;
        let third = app.create_comment("user1", "three").await;

        let last = app
            .rpc("store.last", json!({"site": SITE, "limit": 2}))
            .await;
        let last = last.result().as_array().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0]["id"], third.as_str());

        let mine = app
            .rpc("store.user", json!({"site": SITE, "user_id": "user1"}))
            .await;
        assert_eq!(mine.result().as_array().unwrap().len(), 2);
        let count = app
            .rpc("store.user_count", json!({"site": SITE, "user_id": "user1"}))
            .await;
        assert_eq!(count.result(), &json!(2));

        let info = app.rpc("store.info", post()).await;
        assert_eq!(info.result()["count"], 3);
        assert_eq!(info.result()["read_only"], false);
        let list = app.rpc("store.list", json!({"site": SITE})).await;
        assert_eq!(list.result()[0]["url"], POST);
    }

    #[tokio::test]
    async fn unknown_comment_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.rpc("store.get", json!({"site": SITE, "id": "missing"})).await;
        assert_eq!(res.error(), "comment missing not found");
    }
}

mod edit {
    use super::*;

    #[tokio::test]
    async fn edit_updates_body_and_stamps() {
        let app = TestApp::spawn().await;
        let id = app.create_comment("user1", "typo").await;

        let res = app
            .rpc(
                "store.edit",
                json!({"site": SITE, "id": id, "text": "fixed", "summary": "typo"}),
            )
            .await;

        let comment = res.result();
        assert_eq!(comment["text"], "fixed");
        assert_eq!(comment["edit"]["summary"], "typo");
    }

    #[tokio::test]
    async fn edit_window_is_enforced() {
        let mut config = memstore::config::AppConfig::with_secret("s");
        config.store.edit_window_secs = 0;
        let app = TestApp::spawn_with(config).await;
        let id = app.create_comment("user1", "typo").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let res = app
            .rpc("store.edit", json!({"site": SITE, "id": id, "text": "fixed"}))
            .await;

        assert_eq!(res.error(), "edit window of 0s has expired");
    }
}

mod votes {
    use super::*;

    #[tokio::test]
    async fn up_then_down_twice_leaves_minus_one() {
        let app = TestApp::spawn_with_auth().await;
        let id = app.create_comment("author", "vote on me").await;

        let mut score = json!(null);
        for sign in [1, -1, -1] {
            let res = app
                .rpc(
                    "store.vote",
                    json!({"site": SITE, "id": id, "user_id": "voter", "sign": sign}),
                )
                .await;
            score = res.result().clone();
        }

        assert_eq!(score, json!(-1));
        let comment = app.rpc("store.get", json!({"site": SITE, "id": id})).await;
        assert_eq!(comment.result()["score"], -1);
        assert_eq!(comment.result()["votes"]["voter"], -1);
    }

    #[tokio::test]
    async fn self_vote_and_bad_sign_are_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_comment("author", "vote on me").await;

        let res = app
            .rpc(
                "store.vote",
                json!({"site": SITE, "id": id, "user_id": "author", "sign": 1}),
            )
            .await;
        assert_eq!(res.error(), "can't vote for own comment");

        let res = app
            .rpc(
                "store.vote",
                json!({"site": SITE, "id": id, "user_id": "voter", "sign": 2}),
            )
            .await;
        assert!(res.error().starts_with("invalid params"), "{}", res.text);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn hard_delete_clears_body_and_author() {
        let app = TestApp::spawn_with_auth().await;
        let id = app.create_comment("user1", "regret").await;

        let res = app
            .rpc("store.delete", json!({"site": SITE, "id": id, "mode": "hard"}))
            .await;
        assert_eq!(res.result(), &json!(null));

        let res = app.rpc("store.get", json!({"site": SITE, "id": id})).await;
        let comment = res.result();
        assert_eq!(comment["text"], "");
        assert_eq!(comment["user"]["name"], "");
        assert_eq!(comment["deleted"], true);
    }

    #[tokio::test]
    async fn delete_user_soft_deletes_everything() {
        let app = TestApp::spawn().await;
        app.create_comment("user1", "a").await;
        app.create_comment("user1", "b").await;
        app.create_comment("user2", "c").await;

        let res = app
            .rpc("store.delete_user", json!({"site": SITE, "user_id": "user1"}))
            .await;
        assert_eq!(res.result(), &json!(2));

        let count = app.rpc("store.count", post()).await;
        assert_eq!(count.result(), &json!(1));
    }
}

mod flags {
    use super::*;

    #[tokio::test]
    async fn verified_flag_shows_on_comments() {
        let app = TestApp::spawn().await;
        let id = app.create_comment("user1", "hello").await;

        app.rpc(
            "store.set_verified",
            json!({"site": SITE, "user_id": "user1", "verified": true}),
        )
        .await
        .result();

        let verified = app.rpc("store.verified", json!({"site": SITE})).await;
        assert_eq!(verified.result(), &json!(["user1"]));
        let comment = app.rpc("store.get", json!({"site": SITE, "id": id})).await;
        assert_eq!(comment.result()["user"]["verified"], true);
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn unknown_method_is_a_200_envelope() {
        let app = TestApp::spawn_with_auth().await;

        let res = app.rpc("store.xyz", json!({})).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.error(), "unknown method: store.xyz");
        assert!(res.body["sig"].is_object());
    }

    #[tokio::test]
    async fn malformed_envelope_is_400() {
        let app = TestApp::spawn().await;

        let res = app.post_raw("{\"method\": ").await;
        assert_eq!(res.status, 400);

        let res = app.post_raw("{\"params\": {}}").await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn params_of_wrong_shape_ride_in_envelope() {
        let app = TestApp::spawn().await;

        let res = app.rpc("store.get", json!("not an object")).await;

        assert!(res.error().starts_with("invalid params"), "{}", res.text);
    }

    #[tokio::test]
    async fn replies_carry_signature_headers() {
        let app = TestApp::spawn().await;

        let res = app.rpc("store.count", post()).await;

        assert_eq!(res.headers["app-name"], "memstore");
        assert_eq!(res.headers["author"], "memstore");
        assert_eq!(
            res.headers["app-version"],
            res.body["sig"]["version"].as_str().unwrap()
        );
    }

    #[tokio::test]
    async fn custom_api_root_is_honoured() {
        let mut config = memstore::config::AppConfig::with_secret("s");
        config.server.api_root = "/rpc".into();
        let app = TestApp::spawn_with(config).await;

        let res = app.rpc("store.count", post()).await;
        assert_eq!(res.result(), &json!(0));

        let res = app
            .client
            .post(app.url("/"))
            .json(&json!({"method": "store.count", "id": 1, "params": post()}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 404);
    }
}
