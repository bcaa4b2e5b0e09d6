use hal::{
    clocks::Clocks,
    pac::TIM3,
    timer::{
        Alignment, CaptureCompareDma, CountDir, OutputCompare, TimChannel, Timer, TimerConfig,
        UpdateReqSrc,
    },
};
use rotosense_algo::gimbal::ServoPulses;

use super::pinout;

/// Hobby servo frame rate
pub const SERVO_HZ: u16 = 50;
/// Length of one servo frame [us]
const FRAME_US: u32 = 1_000_000 / SERVO_HZ as u32;

const YAW_CH: TimChannel = TimChannel::C1;
const PITCH_CH: TimChannel = TimChannel::C2;

pub struct ServoPwm {
    tim: Timer<TIM3>,
}

impl ServoPwm {
    pub fn new(tim3: TIM3, clock_cfg: &Clocks) -> Self {
        let mut timer = Timer::new_tim3(
            tim3,
            SERVO_HZ as f32,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::Any,
                auto_reload_preload: true,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );
        timer.enable();

        ServoPwm { tim: timer }
    }

    /// Enables both outputs holding the servos at `initial`
    pub fn begin(&mut self, initial: ServoPulses) {
        self.tim
            .enable_pwm_output(YAW_CH, OutputCompare::Pwm1, 0.0);
        self.tim
            .enable_pwm_output(PITCH_CH, OutputCompare::Pwm1, 0.0);

        self.apply(initial);

        pinout::servo::YAW.init();
        pinout::servo::PITCH.init();
    }

    pub fn apply(&mut self, pulses: ServoPulses) {
        let period = self.tim.get_max_duty();
        self.tim
            .set_duty(YAW_CH, Self::us2period(pulses.yaw_us, period));
        self.tim
            .set_duty(PITCH_CH, Self::us2period(pulses.pitch_us, period));
    }

    fn us2period(pulse_us: u16, period: u32) -> u32 {
        // Timer ticks for the pulse width, clamped to one frame
        let pulse = (pulse_us as u32).min(FRAME_US) as u64;
        (pulse * period as u64 / FRAME_US as u64) as u32
    }
}
