use crate::Debug::DumpConfig;
use crate::MQueue::Structs::{BusEvent, EventOutcome, QueueStats};
use crate::MQueue::{Consumer, Producer, QueueBuilder};
use std::cell::UnsafeCell;
use std::os::raw::c_void;
use std::ptr;
use std::sync::Arc;
use tracing::error;

// Return codes
const MQ_SUCCESS: i32 = 0;
const MQ_ERROR_NULL_POINTER: i32 = -libc::EFAULT;
const MQ_ERROR_TRUNCATED: i32 = -libc::EINVAL;

/// Handle to one queue (opaque pointer).
///
/// The bus side and the read side may live on different threads, but every call to
/// `mq_handle_event` on a handle must be serialized by the caller.
pub struct MqueueHandle {
    producer: UnsafeCell<Producer>,
    consumer: Consumer,
    dump: Arc<DumpConfig>,
}

// `producer` is only reached from `mq_handle_event`, whose callers guarantee serialization.
unsafe impl Sync for MqueueHandle {}

/// C callback for ready notifications.
pub type MqReadyFn = extern "C" fn(ctx: *mut c_void);

struct ReadyContext {
    callback: MqReadyFn,
    ctx: *mut c_void,
}

// The C side owns `ctx` and promises it may be used from the bus context.
unsafe impl Send for ReadyContext {}
unsafe impl Sync for ReadyContext {}

impl ReadyContext {
    fn notify(&self) {
        (self.callback)(self.ctx)
    }
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create a queue for a 7-bit slave `address` on bus `bus_id`.
///
/// # Returns
/// * Pointer to `MqueueHandle`, or NULL on failure.
#[no_mangle]
pub extern "C" fn mq_queue_new(bus_id: i32, address: u16) -> *mut MqueueHandle {
    let dump = DumpConfig::disabled();
    match QueueBuilder::new()
        .with_bus_id(bus_id)
        .with_address(address)
        .with_dump(Arc::clone(&dump))
        .build()
    {
        Ok((producer, consumer)) => Box::into_raw(Box::new(MqueueHandle {
            producer: UnsafeCell::new(producer),
            consumer,
            dump,
        })),
        Err(e) => {
            error!(bus_id, address, error = %e, "FFI: failed to create queue");
            ptr::null_mut()
        }
    }
}

/// Free a queue handle.
#[no_mangle]
pub extern "C" fn mq_queue_free(handle: *mut MqueueHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Bus side
// -----------------------------------------------------------------------------

/// Feed one raw bus event.
///
/// # Arguments
/// * `event` - Framework event code (see `Structs::raw`).
/// * `val` - In: the received byte for write-received. Out: the reply byte for read events.
///
/// # Returns
/// * 0 on success.
/// * -EINVAL if the byte overflowed the message buffer.
/// * -EFAULT if a required pointer is NULL.
#[no_mangle]
pub extern "C" fn mq_handle_event(handle: *mut MqueueHandle, event: u32, val: *mut u8) -> i32 {
    if handle.is_null() {
        return MQ_ERROR_NULL_POINTER;
    }

    let value = if val.is_null() { 0 } else { unsafe { *val } };
    let event = BusEvent::from_raw(event, value);
    if matches!(event, BusEvent::Byte(_) | BusEvent::Other) && val.is_null() {
        return MQ_ERROR_NULL_POINTER;
    }

    // SAFETY: the caller serializes event delivery per handle
    let producer = unsafe { &mut *(*handle).producer.get() };
    match producer.handle_event(event) {
        EventOutcome::Accepted => MQ_SUCCESS,
        EventOutcome::Truncated => MQ_ERROR_TRUNCATED,
        EventOutcome::Reply(byte) => {
            unsafe { *val = byte };
            MQ_SUCCESS
        }
    }
}

// -----------------------------------------------------------------------------
// Read side
// -----------------------------------------------------------------------------

/// Pop one message into `buf`.
///
/// # Returns
/// * Number of bytes copied, 0 if the queue is empty.
/// * -EOVERFLOW if the message exceeded `count` (it is dropped).
/// * -EFAULT if a required pointer is NULL.
#[no_mangle]
pub extern "C" fn mq_read(handle: *const MqueueHandle, buf: *mut u8, count: usize) -> isize {
    if handle.is_null() || (buf.is_null() && count > 0) {
        return MQ_ERROR_NULL_POINTER as isize;
    }

    let consumer = unsafe { &(*handle).consumer };
    let dst: &mut [u8] = if count == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(buf, count) }
    };

    match consumer.drain(dst) {
        Ok(drained) => drained.len as isize,
        Err(e) => e.errno() as isize,
    }
}

/// Register `callback(ctx)` as the ready notification. Pass NULL to unsubscribe.
#[no_mangle]
pub extern "C" fn mq_subscribe_ready(
    handle: *const MqueueHandle,
    callback: Option<MqReadyFn>,
    ctx: *mut c_void,
) -> i32 {
    if handle.is_null() {
        return MQ_ERROR_NULL_POINTER;
    }

    let consumer = unsafe { &(*handle).consumer };
    match callback {
        Some(callback) => {
            let ready = ReadyContext { callback, ctx };
            consumer.subscribe_ready(move || ready.notify());
        }
        None => {
            consumer.unsubscribe_ready();
        }
    }
    MQ_SUCCESS
}

/// Copy the queue counters into `out`.
#[no_mangle]
pub extern "C" fn mq_stats(handle: *const MqueueHandle, out: *mut QueueStats) -> i32 {
    if handle.is_null() || out.is_null() {
        return MQ_ERROR_NULL_POINTER;
    }

    unsafe { *out = (*handle).consumer.stats() };
    MQ_SUCCESS
}

/// Toggle the per-message hex dump. Only reads on bus `bus_id` are dumped.
#[no_mangle]
pub extern "C" fn mq_set_dump(handle: *const MqueueHandle, enabled: bool, bus_id: i32) -> i32 {
    if handle.is_null() {
        return MQ_ERROR_NULL_POINTER;
    }

    let dump = unsafe { &(*handle).dump };
    dump.set_bus_id(bus_id);
    dump.set_enabled(enabled);
    MQ_SUCCESS
}
