//! Serenity delivers Discord events through one callback per event type.  `handler.rs` translates
//! those callbacks into the `Event` enum, which the router here hands to the single event module
//! bound for that kind of event.

use crate::{context::Context, helper::contain, platform::IncomingMessage, registry::LoadError};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// A Discord event
#[derive(Clone, Debug)]
pub enum Event {
    Ready(ReadyInfo),
    Message(IncomingMessage),
}

#[derive(Clone, Debug)]
pub struct ReadyInfo {
    pub user_name: String,
    pub guild_count: usize,
}

/// Event name, one listener each
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Message,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            EventKind::Ready => "ready",
            EventKind::Message => "message",
        })
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready(_) => EventKind::Ready,
            Event::Message(_) => EventKind::Message,
        }
    }
}

/// Extra behavior attached to an event, run before the event's own action when it matches.
#[serenity::async_trait]
pub trait SubHandler: Sync + Send {
    /// Handler name.  Used for debug
    fn name(&self) -> &'static str;
    async fn matches(&self, ctx: &Context<'_>, event: &Event) -> Result<bool>;
    async fn run(&self, ctx: &Context<'_>, event: &Event) -> Result<()>;
}

#[serenity::async_trait]
pub trait EventModule: Sync + Send {
    fn kind(&self) -> EventKind;

    /// Run in order before `run`
    fn sub_handlers(&self) -> &[Box<dyn SubHandler>] {
        &[]
    }

    /// The event's default action
    async fn run(&self, ctx: &Context<'_>, event: &Event) -> Result<()>;
}

/// One bound event module per event kind
#[derive(Default)]
pub struct EventRouter {
    bound: HashMap<EventKind, Arc<dyn EventModule>>,
}

impl EventRouter {
    pub fn bind(&mut self, module: Arc<dyn EventModule>) -> Result<(), LoadError> {
        use std::collections::hash_map::Entry::*;
        match self.bound.entry(module.kind()) {
            Occupied(occupied) => Err(LoadError::AlreadyBound(*occupied.key())),
            Vacant(vacant) => {
                vacant.insert(module);
                Ok(())
            }
        }
    }

    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.bound.contains_key(&kind)
    }

    /// Run every matching sub-handler and then the default action of the module bound to the
    /// event's kind.  Each predicate and action is contained on its own, a failure is logged and
    /// the rest still run.  Returns false if nothing is bound for the event.
    pub async fn fire(&self, ctx: &Context<'_>, event: &Event) -> bool {
        let kind = event.kind();
        let Some(module) = self.bound.get(&kind) else {
            return false;
        };

        for handler in module.sub_handlers() {
            let matched = match contain(handler.matches(ctx, event)).await {
                Ok(matched) => matched,
                Err(err) => {
                    ctx.log(
                        "error",
                        &format!("Error in {} handler `{}` check: {:#}", kind, handler.name(), err),
                    );
                    false
                }
            };

            if !matched {
                continue;
            }

            if let Err(err) = contain(handler.run(ctx, event)).await {
                ctx.log(
                    "error",
                    &format!("Error in {} handler `{}`: {:#}", kind, handler.name(), err),
                );
            }
        }

        if let Err(err) = contain(module.run(ctx, event)).await {
            ctx.log("error", &format!("Error in {} event: {:#}", kind, err));
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        log_buffer::LogBuffer,
        platform::fake::{guild_message, FakePlatform},
        registry::Registry,
    };
    use anyhow::anyhow;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    enum Behavior {
        Ok,
        Fail,
        Panic,
    }

    struct Step {
        name: &'static str,
        check: Behavior,
        action: Behavior,
        trace: Trace,
    }

    fn act(behavior: &Behavior) -> Result<()> {
        match behavior {
            Behavior::Ok => Ok(()),
            Behavior::Fail => Err(anyhow!("failed")),
            Behavior::Panic => panic!("exploded"),
        }
    }

    #[serenity::async_trait]
    impl SubHandler for Step {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn matches(&self, _ctx: &Context<'_>, _event: &Event) -> Result<bool> {
            self.trace.lock().unwrap().push(format!("{}?", self.name));
            act(&self.check).map(|_| true)
        }

        async fn run(&self, _ctx: &Context<'_>, _event: &Event) -> Result<()> {
            self.trace.lock().unwrap().push(self.name.to_owned());
            act(&self.action)
        }
    }

    struct TestEvent {
        handlers: Vec<Box<dyn SubHandler>>,
        trace: Trace,
    }

    #[serenity::async_trait]
    impl EventModule for TestEvent {
        fn kind(&self) -> EventKind {
            EventKind::Message
        }

        fn sub_handlers(&self) -> &[Box<dyn SubHandler>] {
            &self.handlers
        }

        async fn run(&self, _ctx: &Context<'_>, _event: &Event) -> Result<()> {
            self.trace.lock().unwrap().push("default".to_owned());
            Ok(())
        }
    }

    fn step(
        name: &'static str,
        check: Behavior,
        action: Behavior,
        trace: &Trace,
    ) -> Box<dyn SubHandler> {
        Box::new(Step {
            name,
            check,
            action,
            trace: Arc::clone(trace),
        })
    }

    #[tokio::test]
    async fn failing_handlers_do_not_stop_the_rest() {
        let trace = Trace::default();
        let module = TestEvent {
            handlers: vec![
                step("a", Behavior::Fail, Behavior::Ok, &trace),
                step("b", Behavior::Ok, Behavior::Panic, &trace),
                step("c", Behavior::Panic, Behavior::Ok, &trace),
                step("d", Behavior::Ok, Behavior::Fail, &trace),
                step("e", Behavior::Ok, Behavior::Ok, &trace),
            ],
            trace: Arc::clone(&trace),
        };

        let mut router = EventRouter::default();
        router.bind(Arc::new(module)).unwrap();

        let cfg = Config::for_tests("!");
        let registry = Registry::default();
        let logs = Arc::new(LogBuffer::new(None, "log"));
        let platform = FakePlatform::default();
        let ctx = Context {
            cfg: &cfg,
            registry: &registry,
            logs: &logs,
            platform: &platform,
        };

        assert!(router.fire(&ctx, &Event::Message(guild_message("hi"))).await);
        assert_eq!(
            *trace.lock().unwrap(),
            ["a?", "b?", "b", "c?", "d?", "d", "e?", "e", "default"]
        );
        // One error line for each of a, b, c and d
        assert_eq!(logs.len(), 4);
    }

    #[tokio::test]
    async fn unbound_events_are_ignored() {
        let router = EventRouter::default();
        let cfg = Config::for_tests("!");
        let registry = Registry::default();
        let logs = Arc::new(LogBuffer::new(None, "log"));
        let platform = FakePlatform::default();
        let ctx = Context {
            cfg: &cfg,
            registry: &registry,
            logs: &logs,
            platform: &platform,
        };

        let ready = Event::Ready(ReadyInfo {
            user_name: "bot".to_owned(),
            guild_count: 0,
        });
        assert!(!router.fire(&ctx, &ready).await);
    }

    #[test]
    fn each_kind_binds_once() {
        let trace = Trace::default();
        let mut router = EventRouter::default();
        let module = || {
            Arc::new(TestEvent {
                handlers: Vec::new(),
                trace: Arc::clone(&trace),
            })
        };

        router.bind(module()).unwrap();
        assert!(matches!(
            router.bind(module()),
            Err(LoadError::AlreadyBound(EventKind::Message))
        ));
        assert!(router.is_bound(EventKind::Message));
        assert!(!router.is_bound(EventKind::Ready));
    }
}
