use core::cell::RefCell;

use critical_section::Mutex;
use hal::{
    clocks::Clocks,
    pac::TIM2,
    timer::{Alignment, CaptureCompareDma, CountDir, Timer, TimerConfig, UpdateReqSrc},
};
use rotosense_algo::Clock;

/// Counter rate of the timestamp timer
pub const TICK_HZ: u32 = 1_000_000;

static COUNTER: Mutex<RefCell<Option<Timer<TIM2>>>> = Mutex::new(RefCell::new(None));

/// Starts TIM2 as a free-running 32-bit microsecond counter.
///
/// The counter wraps after ~71.6 minutes, timestamps are compared with wrapping arithmetic.
pub fn start(tim2: TIM2, clock_cfg: &Clocks) {
    let mut timer = Timer::new_tim2(
        tim2,
        1.0,
        TimerConfig {
            one_pulse_mode: false,
            update_request_source: UpdateReqSrc::Any,
            auto_reload_preload: false,
            alignment: Alignment::Edge,
            capture_compare_dma: CaptureCompareDma::Update,
            direction: CountDir::Up,
        },
        clock_cfg,
    );

    // Override the rate picked by the constructor: 1 tick per us over the full 32-bit range
    let psc = clock_cfg.apb1_timer() / TICK_HZ - 1;
    timer.set_prescaler(psc as u16);
    timer.set_auto_reload(u32::MAX);
    timer.reset_count();
    timer.enable();

    critical_section::with(|cs| COUNTER.borrow_ref_mut(cs).replace(timer));
}

/// Timestamp source backed by TIM2. Reads 0 until [`start`] has run.
#[derive(Clone, Copy, Default)]
pub struct MicrosClock;

impl Clock for MicrosClock {
    #[inline(always)]
    fn now_us(&self) -> u32 {
        critical_section::with(|cs| {
            COUNTER
                .borrow_ref(cs)
                .as_ref()
                .map_or(0, |timer| timer.read_count())
        })
    }
}
