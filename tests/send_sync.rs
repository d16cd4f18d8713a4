//! Send/Sync guarantees for core types.

use femtoreport::{
    FaultEventBus, FaultSource, FemtoReporter, HandlerSlot, LogSink, QueuedBeacon,
    ReporterBuilder, StaticHostContext, Transport, UreqRequest,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(ReporterBuilder: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(FemtoReporter: Send, Sync);
    assert_impl_all!(Transport: Send, Sync);
    assert_impl_all!(QueuedBeacon: Send, Sync);
    assert_impl_all!(UreqRequest: Send, Sync);
    assert_impl_all!(StaticHostContext: Send, Sync);
    assert_impl_all!(LogSink: Send, Sync);
}

#[rstest]
fn fault_sources_are_send_sync() {
    assert_impl_all!(FaultSource: Send, Sync);
    assert_impl_all!(FaultEventBus: Send, Sync);
    assert_impl_all!(HandlerSlot: Send, Sync);
}
