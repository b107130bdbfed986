#![no_main]

use libfuzzer_sys::fuzz_target;
use vibe_deploy_core::{filter_reaction_event, ReactionEvent, MESSAGE_ITEM_TYPE};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(event) = ReactionEvent::from_json(&raw) else {
        return;
    };
    if let Ok(target) = filter_reaction_event(&event) {
        assert_eq!(event.event.reaction, "rocket");
        assert_eq!(event.event.item.item_type, MESSAGE_ITEM_TYPE);
        assert!(!event.is_self_triggered());
        assert_eq!(target, event.target());
    }
});
