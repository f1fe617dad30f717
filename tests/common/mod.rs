//! Shared fixture: a small users catalog service with the contract declared
//! in code, a handful of handlers, and a dispatcher wired over them.

#![allow(dead_code)]

use http::Method;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use wireshape::dispatcher::Dispatcher;
use wireshape::error::HandlerError;
use wireshape::registry::{Registry, Route};
use wireshape::runtime_config::RuntimeConfig;
use wireshape::shape::{Field, IntegerRules, Shape, StringRules};

/// Fixture users known to every test. `boom` and `panicnow` are reserved ids
/// that make the store fail in specific ways.
pub const USERS: &[(&str, &str)] = &[
    ("abc123", "abc@example.com"),
    ("def456", "def@example.com"),
    ("ghi789", "ghi@example.com"),
];

pub fn id_rules() -> StringRules {
    StringRules::new().pattern(Regex::new("^[a-z0-9]+$").expect("id pattern"))
}

pub fn user_shape() -> Shape {
    Shape::record([
        Field::new("id", Shape::String(id_rules())),
        Field::new("email", Shape::String(StringRules::new().max_len(100))),
    ])
}

pub fn page_shape() -> Shape {
    Shape::record([
        Field::new("skip", Shape::Integer(IntegerRules::new().min(0))),
        Field::new("limit", Shape::Integer(IntegerRules::new().min(1).max(200))),
        Field::new("total", Shape::Integer(IntegerRules::new().min(0))),
        Field::new("items", Shape::sequence(user_shape())),
    ])
}

pub fn page_query_shape() -> Shape {
    Shape::record([
        Field::new(
            "skip",
            Shape::optional(Shape::Integer(IntegerRules::new().min(0))),
        ),
        Field::new(
            "limit",
            Shape::optional(Shape::Integer(IntegerRules::new().min(1).max(200))),
        ),
    ])
}

pub fn user_params_shape() -> Shape {
    Shape::record([Field::new("id", Shape::String(id_rules()))])
}

/// Build the fixture route catalog.
pub fn build_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Route::new(Method::GET, "/users", "list_users", page_shape())
                .query(page_query_shape()),
        )
        .expect("list_users route");
    registry
        .register(
            Route::new(Method::GET, "/users/:id", "get_user", user_shape())
                .params(user_params_shape()),
        )
        .expect("get_user route");
    registry
        .register(
            Route::new(Method::POST, "/users", "create_user", user_shape())
                .payload(user_shape()),
        )
        .expect("create_user route");
    registry
        .register(Route::new(
            Method::GET,
            "/stats",
            "get_stats",
            Shape::record([Field::new("count", Shape::integer())]),
        ))
        .expect("get_stats route");
    registry
        .register(Route::new(
            Method::GET,
            "/broken",
            "broken_output",
            Shape::record([Field::new("id", Shape::string())]),
        ))
        .expect("broken_output route");
    registry
}

fn user_json(id: &str, email: &str) -> Value {
    json!({ "id": id, "email": email })
}

/// Build a dispatcher over the fixture registry with all handlers registered.
pub fn build_dispatcher(config: RuntimeConfig) -> Dispatcher {
    let registry = Arc::new(build_registry());
    let mut dispatcher = Dispatcher::with_config(registry, config);

    unsafe {
        dispatcher.register_handler("list_users", |req| {
            // Absent optional query members arrive as null; the handler owns
            // the defaults.
            let skip = req.query_param("skip").and_then(Value::as_i64).unwrap_or(0);
            let limit = req
                .query_param("limit")
                .and_then(Value::as_i64)
                .unwrap_or(200);
            let items: Vec<Value> = USERS
                .iter()
                .skip(skip as usize)
                .take(limit as usize)
                .map(|(id, email)| user_json(id, email))
                .collect();
            Ok(json!({
                "skip": skip,
                "limit": limit,
                "total": USERS.len(),
                "items": items,
            }))
        });

        dispatcher.register_handler("get_user", |req| {
            let id = req
                .param("id")
                .and_then(Value::as_str)
                .ok_or_else(|| HandlerError::internal("id parameter missing"))?;
            match id {
                "boom" => Err(HandlerError::internal("user store connection refused")),
                "panicnow" => panic!("user store corrupted"),
                _ => USERS
                    .iter()
                    .find(|(uid, _)| *uid == id)
                    .map(|(uid, email)| user_json(uid, email))
                    .ok_or_else(|| {
                        HandlerError::record_not_found(format!("user `{id}` not found"))
                    }),
            }
        });

        dispatcher.register_handler("create_user", |req| {
            // Payload is already checked; echo it back as the stored record.
            Ok(req.payload.clone())
        });

        dispatcher.register_handler("get_stats", |_req| {
            // Past 2^53-1: must travel as a string on the wire.
            Ok(json!({ "count": 9_007_199_254_740_993_i64 }))
        });

        dispatcher.register_handler("broken_output", |_req| {
            // Violates the declared output shape (`id` must be a string).
            Ok(json!({ "id": 7 }))
        });
    }

    dispatcher
}
