#![no_main]

use libfuzzer_sys::fuzz_target;
use vibe_deploy_core::{
    match_completion_notice, CompletionNotice, CompletionVerdict, StatusMutation,
    GO_LIVE_INSTRUCTION,
};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(notice) = CompletionNotice::from_json(&raw) else {
        return;
    };
    if let CompletionVerdict::Completed(target) = match_completion_notice(&notice) {
        assert_eq!(notice.kind, "vibe-deploy");
        assert_eq!(notice.command, GO_LIVE_INSTRUCTION);
        assert!(!target.channel.is_empty() && !target.ts.is_empty());
        let [first, second] = StatusMutation::completion_pair(&target);
        assert!(first.remove && !second.remove);
    }
});
