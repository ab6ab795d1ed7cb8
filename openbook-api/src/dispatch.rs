//! Post-commit notification fan-out seam.
//!
//! The core's whole contract with the notification infrastructure is
//! "enqueue a job reference after the database commit succeeds". Execution
//! of the fan-out belongs to the external queue worker pool.

use openbook_common::model::Id;
use openbook_common::model::post::{CommentMarker, PostMarker, ReactionMarker};
use tracing::info;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ContentEvent {
    PostCreated {
        post: Id<PostMarker>,
    },
    CommentCreated {
        post: Id<PostMarker>,
        comment: Id<CommentMarker>,
    },
    ReactionCreated {
        post: Id<PostMarker>,
        reaction: Id<ReactionMarker>,
    },
}

pub trait NotificationDispatcher: Send + Sync {
    /// Must only be called once the triggering transaction has committed.
    fn enqueue(&self, event: ContentEvent);
}

/// Default dispatcher: hands the job reference to the queue by logging it.
/// The worker pool that consumes these is outside this codebase.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn enqueue(&self, event: ContentEvent) {
        info!(?event, "Enqueued notification fan-out job");
    }
}

#[cfg(test)]
pub mod testing {
    use super::{ContentEvent, NotificationDispatcher};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct RecordingDispatcher {
        events: Mutex<Vec<ContentEvent>>,
    }

    impl RecordingDispatcher {
        pub fn events(&self) -> Vec<ContentEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl NotificationDispatcher for RecordingDispatcher {
        fn enqueue(&self, event: ContentEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::testing::RecordingDispatcher;
    use crate::dispatch::{ContentEvent, NotificationDispatcher};
    use openbook_common::model::Id;

    #[test]
    fn recording_dispatcher_keeps_order() {
        let dispatcher = RecordingDispatcher::default();
        dispatcher.enqueue(ContentEvent::PostCreated { post: Id::new(1) });
        dispatcher.enqueue(ContentEvent::CommentCreated {
            post: Id::new(1),
            comment: Id::new(2),
        });

        assert_eq!(
            dispatcher.events(),
            vec![
                ContentEvent::PostCreated { post: Id::new(1) },
                ContentEvent::CommentCreated {
                    post: Id::new(1),
                    comment: Id::new(2),
                },
            ]
        );
    }
}
