pub mod detection;
pub mod dispatch;
pub mod handlers;
pub mod registry;
pub mod types;

use std::sync::Arc;

use devhelper_core::BotControl;

pub use detection::{command_name, has_command_prefix, tokenize, BARE_COMMANDS};
pub use dispatch::{ButtonHandler, CommandDispatcher, CommandHandler};
pub use handlers::{
    activate_reply, builtin_defs, status_text, ActiveHandler, BotHandler, BotStatusHandler,
    DeactivateHandler, HelpButtonHandler, HelpHandler, PingHandler,
};
pub use registry::{CommandRegistry, RegisteredCommand};
pub use types::{CommandCategory, CommandDef, CommandInvocation};

/// Build a dispatcher pre-wired with all built-in handlers.
///
/// Knowledge-base commands are registered on top of this by the caller
/// before the dispatcher is shared.
pub fn build_default_dispatcher(control: Arc<dyn BotControl>) -> CommandDispatcher {
    let mut dispatcher = CommandDispatcher::new();

    for def in builtin_defs() {
        let handler: Arc<dyn CommandHandler> = match def.name.as_str() {
            "ping" => Arc::new(PingHandler { control: control.clone() }),
            "botstatus" => Arc::new(BotStatusHandler { control: control.clone() }),
            "active" => Arc::new(ActiveHandler { control: control.clone() }),
            "deactivate" => Arc::new(DeactivateHandler { control: control.clone() }),
            "bot" => Arc::new(BotHandler { control: control.clone() }),
            "help" => Arc::new(HelpHandler { commands: builtin_defs() }),
            other => {
                tracing::warn!("[Commands] No built-in handler for '{}'", other);
                continue;
            }
        };
        dispatcher.register(def, handler);
    }

    dispatcher.register_button("help", Arc::new(HelpButtonHandler));
    dispatcher
}
