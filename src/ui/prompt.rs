use colored::*;
use dialoguer::Confirm;

/// 덮어쓰기/재귀 삭제 전에 사용자 확인을 받는 기능
///
/// 오케스트레이터가 구현체를 주입하므로 터미널 없이도 테스트할 수 있습니다.
pub trait Confirmation {
    fn confirm(&self, question: &str) -> bool;
}

/// dialoguer 기반 대화형 확인 (기본값: 아니오)
pub struct ConfirmPrompt;

impl ConfirmPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfirmPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirmation for ConfirmPrompt {
    fn confirm(&self, question: &str) -> bool {
        let prompt = format!("{} {}", "[?]".yellow().bold(), question);

        match Confirm::new().with_prompt(prompt).default(false).interact() {
            Ok(answer) => answer,
            Err(e) => {
                // 터미널이 아니면 (파이프 입력 등) 거절로 처리
                tracing::debug!("confirmation unavailable: {}", e);
                false
            }
        }
    }
}

/// 항상 같은 답을 돌려주는 확인 (`--yes`, 테스트용)
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmation for AutoConfirm {
    fn confirm(&self, question: &str) -> bool {
        tracing::debug!(answer = self.0, "auto-confirm: {}", question);
        self.0
    }
}
