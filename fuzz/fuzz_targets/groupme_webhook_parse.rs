#![no_main]

use crow_groupme::GroupMeMessage;
use crow_relay::{ChatMessage, IntentFilter, SeededRoll, DEFAULT_TRIGGER_PHRASE};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = serde_json::from_slice::<GroupMeMessage>(data) else {
        return;
    };
    let filter = IntentFilter::new(DEFAULT_TRIGGER_PHRASE, 20, Arc::new(SeededRoll::new(0)));
    let chat = ChatMessage::new(message.group_id, message.sender_type, message.text);
    if let Ok(decision) = filter.should_respond(&chat) {
        if decision.should_respond() {
            assert!(!decision.effective_text().is_empty());
        }
        assert_eq!(decision.effective_text(), decision.effective_text().trim());
    }
});
