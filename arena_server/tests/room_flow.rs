mod support;

use serde_json::json;

// Every test in this binary shares one server, so the whole room lifecycle lives in one test.
#[tokio::test]
async fn when_four_players_connect_and_pick_classes_then_game_starts() {
    let mut clients = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..4 {
        let mut client = support::connect().await;
        let identity = support::recv(&mut client).await;
        assert_eq!(identity["type"], "identity");
        ids.push(identity["data"]["playerId"].as_str().expect("id").to_string());
        clients.push(client);
    }

    let mut room_ids = Vec::new();
    for client in clients.iter_mut() {
        let created = support::recv_kind(client, "roomCreated").await;
        assert_eq!(created["data"]["selectionTime"], 30);
        assert_eq!(created["data"]["unlockedAbilities"]["light"], json!(["stealth"]));
        room_ids.push(created["data"]["roomId"].clone());
    }
    assert!(room_ids.iter().all(|id| *id == room_ids[0]));

    let rooms: Vec<serde_json::Value> = reqwest::get(support::http_url("/rooms"))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["status"], "selection");
    assert_eq!(rooms[0]["players"], 4);

    support::send(
        &mut clients[0],
        json!({"type": "selectClass", "data": {"playerClass": "wizard", "ability": "stealth"}}),
    )
    .await;
    let error = support::recv_kind(&mut clients[0], "error").await;
    assert_eq!(error["data"]["message"], "Unknown class");

    for client in clients.iter_mut() {
        support::send(
            client,
            json!({"type": "selectClass", "data": {"playerClass": "light", "ability": "stealth"}}),
        )
        .await;
    }

    for client in clients.iter_mut() {
        let started = support::recv_kind(client, "gameStarted").await;
        assert_eq!(started["data"]["roomId"], room_ids[0]);
    }

    let update = support::recv_kind(&mut clients[1], "gameUpdate").await;
    let players = update["data"]["players"].as_array().expect("players");
    assert_eq!(players.len(), 4);
}
