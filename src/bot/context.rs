use crate::bot::command::CommandParser;
use crate::bot::handlers::EventRouter;
use crate::bot::ChatClientRef;

/// Immutable services used while handling events.
pub struct BotContext {
    pub parser: CommandParser,
    pub router: EventRouter,
    pub chat: ChatClientRef,
}

impl BotContext {
    pub fn new(parser: CommandParser, router: EventRouter, chat: ChatClientRef) -> Self {
        Self {
            parser,
            router,
            chat,
        }
    }
}
