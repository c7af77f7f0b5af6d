use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use solidkit_core::{
    CancellableOperation, CancellableRegistor, CommandState, Error, OperationHooks, OperationState,
};

#[test]
fn test_finishing_a_command_finishes_its_gizmo_race() {
    let registor = CancellableRegistor::new();
    registor.begin();

    let (move_op, _move_resolver) = CancellableOperation::<()>::delay();
    let (rotate_op, _rotate_resolver) = CancellableOperation::<()>::delay();
    let race = CancellableOperation::race(vec![move_op.clone(), rotate_op.clone()])
        .resource(&registor)
        .expect("running command accepts resources");

    registor.finish();

    assert_eq!(registor.state(), CommandState::Finished);
    assert!(matches!(race.now_or_never(), Some(Ok(()))));
    assert_eq!(move_op.state(), OperationState::Cancelled);
    assert_eq!(rotate_op.state(), OperationState::Cancelled);
}

#[test]
fn test_cancel_order_resources_then_ensure() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let registor = CancellableRegistor::new();
    registor.begin();

    let l = log.clone();
    let op = CancellableOperation::<u32>::new(move |_| {
        OperationHooks::new(move || l.borrow_mut().push("dispose"), || {})
    });
    let op = op.resource(&registor).expect("registered");

    let l = log.clone();
    registor
        .ensure(move || l.borrow_mut().push("ensure"))
        .expect("ensure accepted");

    registor.cancel();

    assert_eq!(*log.borrow(), vec!["dispose", "ensure"]);
    assert!(matches!(op.now_or_never(), Some(Err(Error::Cancel))));
}

#[test]
fn test_late_resource_is_cancelled() {
    let registor = CancellableRegistor::new();
    registor.begin();
    registor.finish();

    let (op, _resolver) = CancellableOperation::<()>::delay();
    let result = op.clone().resource(&registor);

    assert!(matches!(result, Err(Error::AlreadyFinished)));
    assert_eq!(op.state(), OperationState::Cancelled);
}
