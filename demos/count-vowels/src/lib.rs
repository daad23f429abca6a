//! Vowel counting plugin.
//!
//! - `count_vowels` (typed): text in, `{"count", "total", "vowels"}` out.
//! - `count_vowels_io` (direct): the same over the call input/output.
//! - `reflect_input` (direct): round-trips the input through the host's
//!   `reflect` function.
//!
//! The vowel set comes from the `vowels` config key. A running total is
//! kept in the `total` variable.

use anyhow::bail;
use plugwire_guest::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VOWELS: &str = "aeiouAEIOU";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelCount {
    pub count: i64,
    pub total: i64,
    pub vowels: String,
}

fn count(host: &mut dyn HostInterface, text: &str) -> PluginResult<VowelCount> {
    let vowels = config::get(host, "vowels")?.unwrap_or_else(|| DEFAULT_VOWELS.to_string());
    let count = text.chars().filter(|c| vowels.contains(*c)).count() as i64;

    let total = match var::get_text(host, "total")? {
        Some(previous) => previous.parse::<i64>()? + count,
        None => count,
    };
    var::set(host, "total", total.to_string())?;
    debug!(host, "{count} vowels, {total} so far");

    Ok(VowelCount { count, total, vowels })
}

pub fn module() -> PluginModule {
    let mut builder = ModuleBuilder::default();
    let reflect = builder.host_fn(
        "reflect",
        Signature::new().param_of::<String>("text").returns_of::<String>(),
    );

    builder.export_typed(
        "count_vowels",
        Signature::new()
            .param_of::<String>("text")
            .returns_of::<Json<VowelCount>>(),
        |host, mut args| {
            let text: String = args.take(0)?;
            Ok(Json(count(host, &text)?).into_value())
        },
    );

    builder.export_direct("count_vowels_io", |host| {
        let text = io::input_text(host)?;
        let result = count(host, &text)?;
        io::output(host, Json(result))
    });

    builder.export_direct("reflect_input", move |host| {
        let text = io::input_text(host)?;
        let Some(echoed) = reflect.call_as::<Option<String>>(host, vec![text.into_value()])? else {
            bail!("reflect returned nothing");
        };
        io::output_text(host, &echoed)
    });

    builder.build()
}

plugwire_guest::plugin_module!(module, direct: [count_vowels_io, reflect_input]);
