//! Emoji reactions instead of short replies

use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{
    Arguments, CallResult, DirectKind, DirectPayload, FunctionSpec,
};
use async_trait::async_trait;
use serde_json::json;

/// Reactions a chat platform accepts on messages
const EMOJIS: &[&str] = &[
    "👍", "👎", "❤", "🔥", "🥰", "👏", "😁", "🤔", "🤯", "😱", "🤬", "😢", "🎉", "🤩", "🤮",
    "💩", "🙏", "👌", "🕊", "🤡", "🥱", "🥴", "😍", "🐳", "❤‍🔥", "🌚", "🌭", "💯", "🤣", "⚡",
    "🍌", "🏆", "💔", "🤨", "😐", "🍓", "🍾", "💋", "🖕", "😈", "😴", "😭", "🤓", "👻", "👨‍💻",
    "👀", "🎃", "🙈", "😇", "😨", "🤝", "✍", "🤗", "🫡", "🎅", "🎄", "☃", "💅", "🤪", "🗿",
    "🆒", "💘", "🙉", "🦄", "😘", "💊", "🙊", "😎", "👾", "🤷‍♂", "🤷", "🤷‍♀", "😡",
];

const FALLBACK: &str = "👍";

/// Respond with an emoji reaction
#[derive(Debug, Default, Clone, Copy)]
pub struct Reaction;

#[async_trait]
impl Capability for Reaction {
    fn source_name(&self) -> &str {
        "Reaction"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "react_with_emoji",
            "Respond with a specified emoji reaction instead of short messages",
            json!({
                "type": "object",
                "properties": {
                    "reaction": {
                        "type": "string",
                        "description": "Emoji reaction to respond with",
                        "enum": EMOJIS,
                    }
                },
                "required": ["reaction"],
            }),
        )]
    }

    async fn execute(
        &self,
        function_name: &str,
        _host: &dyn HostServices,
        args: Arguments,
    ) -> CallResult {
        if function_name != "react_with_emoji" {
            return PluginError::UnknownFunction(function_name.to_string()).into();
        }

        // Dispatch rejects unlisted emoji via the schema enum; this fallback
        // only applies when `execute` is called directly
        let reaction = args
            .get_str("reaction")
            .filter(|r| EMOJIS.contains(r))
            .unwrap_or(FALLBACK);

        CallResult::direct(DirectKind::Reaction, DirectPayload::Text(reaction.to_string()))
    }
}
