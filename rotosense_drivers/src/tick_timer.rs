use hal::{
    clocks::Clocks,
    pac::TIM6,
    timer::{
        Alignment, CaptureCompareDma, CountDir, Timer, TimerConfig, TimerInterrupt, UpdateReqSrc,
    },
};

/// Periodic update interrupt pacing telemetry and battery sampling
pub struct TickTimer {
    tim: Timer<TIM6>,
}

impl TickTimer {
    pub fn new(tim6: TIM6, clock_cfg: &Clocks, freq: u16) -> Self {
        let mut timer = Timer::new_tim6(
            tim6,
            freq as f32,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::OverUnderflow,
                auto_reload_preload: true,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );
        timer.enable_interrupt(TimerInterrupt::Update);
        timer.enable();

        TickTimer { tim: timer }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.tim.clear_interrupt(TimerInterrupt::Update);
    }
}
