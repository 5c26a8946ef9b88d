// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ChatML prompt formatting (Qwen2 instruct models)

pub const SYSTEM_PROMPT: &str = "You are a helpful remote sensing image analysis assistant.";

pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";
pub const END_OF_TEXT: &str = "<|endoftext|>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Render messages as ChatML; optionally open an assistant turn for generation
pub fn apply_chat_template(messages: &[ChatMessage], add_generation_prompt: bool) -> String {
    let mut text = String::new();
    for message in messages {
        text.push_str(IM_START);
        text.push_str(message.role.as_str());
        text.push('\n');
        text.push_str(&message.content);
        text.push_str(IM_END);
        text.push('\n');
    }
    if add_generation_prompt {
        text.push_str(IM_START);
        text.push_str(Role::Assistant.as_str());
        text.push('\n');
    }
    text
}

/// The prompt the caption decoder conditions on
pub fn caption_prompt(instruction: &str) -> String {
    apply_chat_template(
        &[
            ChatMessage::new(Role::System, SYSTEM_PROMPT),
            ChatMessage::new(Role::User, instruction),
        ],
        true,
    )
}
