use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use solidkit_command::{
    Command, CommandExecutor, CommandExt, CommandRegistry, GeometryDatabase, InMemoryDocument,
    Item,
};
use solidkit_core::{CancellableOperation, CancellableRegistor, EventBus, Result};
use solidkit_gizmo::InputRouter;
use tokio::task::LocalSet;

/// Places a point once the user confirms.
struct PlacePoint {
    registor: CancellableRegistor,
    doc: Rc<InMemoryDocument>,
}

#[async_trait(?Send)]
impl Command for PlacePoint {
    fn title(&self) -> &str {
        "Place Point"
    }

    fn registor(&self) -> &CancellableRegistor {
        &self.registor
    }

    async fn execute(&self) -> Result<()> {
        let (confirm, _resolver) = CancellableOperation::<()>::delay();
        self.register(confirm)?.await?;
        self.doc.add_item(Item::new("point"));
        Ok(())
    }
}

fn setup() -> (Rc<InMemoryDocument>, InputRouter, CommandRegistry<InMemoryDocument>) {
    let doc = Rc::new(InMemoryDocument::new());
    let router = InputRouter::new();
    router.bind_key("p", "place-point");
    router.bind_key("Enter", "command:finish");
    let executor = CommandExecutor::builder(doc.clone(), doc.clone(), Arc::new(EventBus::new()))
        .router(router.clone())
        .build();
    let registry = CommandRegistry::new(executor);
    let d = doc.clone();
    registry.register("place-point", move || {
        Rc::new(PlacePoint {
            registor: CancellableRegistor::new(),
            doc: d.clone(),
        })
    });
    (doc, router, registry)
}

#[tokio::test]
async fn test_key_binding_dispatches_registered_command() {
    let (doc, router, registry) = setup();
    let local = LocalSet::new();
    local
        .run_until(async {
            let _attached = registry.attach(&router);
            router.press_key("p");
            assert!(registry.executor().is_busy());
            assert_eq!(registry.executor().active_title().as_deref(), Some("Place Point"));

            router.press_key("Enter");
            tokio::task::yield_now().await;
        })
        .await;
    local.await;

    assert!(!registry.executor().is_busy());
    assert_eq!(doc.len(), 1);
    assert_eq!(registry.last().as_deref(), Some("place-point"));
}

#[tokio::test]
async fn test_repeat_last_runs_a_fresh_instance() {
    let (doc, _router, registry) = setup();
    let local = LocalSet::new();
    local
        .run_until(async {
            let first = registry.run("place-point").expect("registered");
            registry.executor().finish_active();
            first.await;

            let again = registry.repeat_last().expect("remembered");
            assert_eq!(registry.executor().active_title().as_deref(), Some("Place Point"));
            registry.executor().finish_active();
            again.await;
        })
        .await;

    assert_eq!(doc.len(), 2);
    assert_eq!(registry.executor().history().borrow().len(), 2);
}
