use std::sync::Arc;

use axum::response::Response;
use bytes::Bytes;
use uuid::Uuid;

use crate::Resp;

use super::{server::DraftServer, DraftOptions};

#[derive(serde::Deserialize)]
struct ChooseRequest {
    cards: Vec<String>,
}

fn parse_id(id: &str) -> Result<Uuid, Response<String>> {
    Uuid::parse_str(id).map_err(|_| Resp::e422(format!("Invalid draft id: {id}")))
}

pub fn handle_join(server: Arc<DraftServer>, body: Bytes) -> Response<String> {
    let options: DraftOptions = match serde_json::from_slice(&body) {
        Ok(options) => options,
        Err(e) => return Resp::e422(format!("Invalid draft options: {e}")),
    };

    match server.join_draft(options) {
        Ok((id, draft)) => Resp::value(
            "Joined draft.",
            &serde_json::json!({ "id": id, "draft": draft }),
        ),
        Err(status) => Resp::status(&status),
    }
}

pub fn handle_current(server: Arc<DraftServer>, id: &str) -> Response<String> {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match server.current_draft(id) {
        Ok(draft) => Resp::value("ok", &draft),
        Err(status) => Resp::status(&status),
    }
}

pub fn handle_next_pool(server: Arc<DraftServer>, id: &str) -> Response<String> {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match server.next_pool(id) {
        Ok((cards, state)) => Resp::value(
            "ok",
            &serde_json::json!({ "cards": cards, "state": state }),
        ),
        Err(status) => Resp::status(&status),
    }
}

pub fn handle_choose(server: Arc<DraftServer>, id: &str, body: Bytes) -> Response<String> {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let req: ChooseRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => return Resp::e422(format!("Invalid card selection: {e}")),
    };

    match server.choose_cards(id, &req.cards) {
        Ok(draft) => Resp::value("Cards chosen.", &draft),
        Err(status) => Resp::status(&status),
    }
}

pub fn handle_close(server: Arc<DraftServer>, id: &str) -> Response<String> {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match server.close_draft(id) {
        Ok(()) => Resp::ok("Draft closed."),
        Err(status) => Resp::status(&status),
    }
}

pub fn handle_decode(server: Arc<DraftServer>, code: &str) -> Response<String> {
    match server.decode_deck(code) {
        Ok(cards) => Resp::value("ok", &cards),
        Err(status) => Resp::status(&status),
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use bytes::Bytes;

    use crate::cards::CardCatalog;
    use crate::draft::{server::DraftServer, DraftConfig};

    use super::*;

    fn server() -> Arc<DraftServer> {
        Arc::new(DraftServer::new(
            Arc::new(CardCatalog::sample(3, 15)),
            DraftConfig::new(),
        ))
    }

    fn body(resp: &Response<String>) -> serde_json::Value {
        serde_json::from_str(resp.body()).unwrap()
    }

    fn join(server: &Arc<DraftServer>) -> String {
        let resp = handle_join(
            server.clone(),
            Bytes::from_static(br#"{"draftFormat":"ETERNAL","rarityRestriction":"ANY_RARITY"}"#),
        );
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert_eq!(json["success"], true);
        assert_eq!(json["value"]["draft"]["state"], "INIT");
        json["value"]["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_draft_requests() {
        let server = server();
        let id = join(&server);

        let resp = handle_next_pool(server.clone(), &id);
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert_eq!(json["value"]["state"], "INITIAL_SELECTION");
        let cards = json["value"]["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 4);

        let chosen = serde_json::json!({ "cards": [cards[0]["cardCode"], cards[1]["cardCode"]] });
        let resp = handle_choose(server.clone(), &id, Bytes::from(chosen.to_string()));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(&resp)["value"]["state"], "RANDOM_SELECTION_1");

        let resp = handle_current(server.clone(), &id);
        assert_eq!(body(&resp)["value"]["deck"]["numCards"], 2);

        assert_eq!(handle_close(server.clone(), &id).status(), StatusCode::OK);
        let resp = handle_current(server, &id);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&resp)["code"], "NOT_IN_DRAFT_SESSION");
    }

    #[test]
    fn test_bad_requests() {
        let server = server();

        let resp = handle_join(server.clone(), Bytes::from_static(b"{}"));
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body(&resp);
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INVALID_CLIENT_REQ");

        let resp = handle_next_pool(server.clone(), "not-a-uuid");
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let id = join(&server);
        let resp = handle_choose(server.clone(), &id, Bytes::from_static(b"[]"));
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // No pool has been offered yet.
        let resp = handle_choose(server, &id, Bytes::from_static(br#"{"cards":[]}"#));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body(&resp)["code"], "NOT_WAITING_FOR_CARD_SELECTION");
    }

    #[test]
    fn test_decode_request() {
        let server = server();
        let resp = handle_decode(server.clone(), "not a deck code");
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body(&resp)["code"], "INVALID_DECK_CODE");

        let id = join(&server);
        let resp = handle_next_pool(server.clone(), &id);
        let card = body(&resp)["value"]["cards"][0].clone();
        let code = crate::deckcode::encode(&[(card["cardCode"].as_str().unwrap(), 2)]).unwrap();

        let resp = handle_decode(server, &code);
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert_eq!(json["value"][0]["card"], card);
        assert_eq!(json["value"][0]["count"], 2);
    }
}
