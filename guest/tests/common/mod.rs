//! Shared fixtures for guest integration tests: a small plugin built
//! with the guest capabilities and an edge over a mock host.

#![allow(dead_code)]

use anyhow::Context;
use plugwire_engine::MockHost;
use plugwire_guest::prelude::*;
use plugwire_guest::Edge;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub calls: i64,
    pub thing: String,
}

// ── Export indices ──

pub const GREET: i32 = 0;
pub const TALLY: i32 = 1;
pub const FETCH_TODO: i32 = 2;
pub const SUM: i32 = 3;

pub const TODO_URL: &str = "https://todos.test/1";

/// Read the call count stored in `calls`, defaulting to 0.
fn calls(host: &mut dyn HostInterface) -> PluginResult<i64> {
    let Some(text) = var::get_text(host, "calls")? else {
        return Ok(0);
    };
    text.parse::<i64>().context("`calls` is not a number")
}

pub fn plugin() -> PluginModule {
    let mut builder = ModuleBuilder::default();

    builder.export_direct("greet", |host| {
        let name = io::input_text(host)?;
        info!(host, "greeting {name}");
        io::output_text(host, &format!("Hello, {name}!"))
    });

    builder.export_direct("tally", |host| {
        let n = calls(host)? + 1;
        var::set(host, "calls", n.to_string())?;
        let thing = config::get(host, "thing")?.unwrap_or_else(|| "world".to_string());
        io::output(host, Json(Summary { calls: n, thing }))
    });

    builder.export_direct("fetch_todo", |host| {
        let response = http::request(host, &HttpRequest::new(TODO_URL), None)?;
        if response.status_code() != 200 {
            anyhow::bail!("unexpected status {}", response.status_code());
        }
        let todo: Todo = response.json()?;
        io::output(host, Json(todo))
    });

    builder.export_typed(
        "sum",
        Signature::new()
            .param("a", TypeTag::Integer)
            .param("b", TypeTag::Integer)
            .returns(TypeTag::Integer),
        |_, mut args| Ok((args.take::<i64>(0)? + args.take::<i64>(1)?).into_value()),
    );

    builder.build()
}

pub fn edge(host: MockHost) -> Edge<MockHost> {
    Edge::new(plugin(), host)
}
