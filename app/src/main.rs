#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_probe as _;

use hal::{
    self,
    adc::{Adc, AdcDevice, Align, InputType, SampleTime},
    clocks::Clocks,
    dma,
    dma::{Dma, DmaChannel, DmaInput, DmaInterrupt, DmaPeriph},
    pac,
    pac::{ADC1, DMA1},
};

use rotosense_algo::{
    analog::battery::GaugeConfig,
    gimbal::MapperConfig,
    link::{ControlCommand, PacketDecoder},
    DefaultHallSensor, EdgeRouter, RoverController, SensorConfig,
};
use rotosense_drivers::{
    micros::MicrosClock,
    pinout::battery::{CONTROL_CHANNEL, DRIVE_CHANNEL},
};

use core::sync::atomic::{AtomicBool, Ordering};

use cortex_m;

/// Rotation sensor shared between the EXTI handler and the telemetry task
static HALL: DefaultHallSensor<MicrosClock> = DefaultHallSensor::new(MicrosClock, SensorConfig::DEFAULT);
static ROUTER: EdgeRouter = EdgeRouter::new();

/// Telemetry rate [Hz]
const TELEMETRY_HZ: u16 = 10;

// Pack voltage at ADC full scale, divider ratio included
const CONTROL_FULL_SCALE_MV: i32 = 13_200;
const DRIVE_FULL_SCALE_MV: i32 = 19_800;

const SAMPLING_COUNT: usize = 2;
const ADC1_SEQUENCE: [u8; SAMPLING_COUNT] = [CONTROL_CHANNEL, DRIVE_CHANNEL];

static mut ADC_READ_BUF: [u16; SAMPLING_COUNT] = [0; SAMPLING_COUNT];
// Set once the first battery conversion has landed in ADC_READ_BUF
static ADC_READY: AtomicBool = AtomicBool::new(false);

#[rtic::app(device = pac, peripherals = true, dispatchers = [TIM7])]
mod app {
    use super::*;

    use rotosense_drivers::*;

    #[shared]
    struct Shared {
        link: serial_link::SerialLink,
        rover: RoverController,
        dma1: Dma<DMA1>,
    }

    #[local]
    struct Local {
        servos: servo_pwm::ServoPwm,
        decoder: PacketDecoder,
        tick: tick_timer::TickTimer,
        adc1: Adc<ADC1>,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();

        let sysclk_freq = clock_cfg.sysclk(); // System clock frequency in Hz
        defmt::debug!("SYSTEM: Clock frequency is {} MHz", sysclk_freq / 1000000);

        micros::start(dp.TIM2, &clock_cfg);

        hall_input::init_hall_input();
        ROUTER.bind(hall_input::HALL_LINE, &HALL).unwrap();

        let rover = RoverController::new(
            MapperConfig::DEFAULT,
            GaugeConfig::lipo(2, CONTROL_FULL_SCALE_MV),
            GaugeConfig::lipo(3, DRIVE_FULL_SCALE_MV),
        );

        let mut servos = servo_pwm::ServoPwm::new(dp.TIM3, &clock_cfg);
        servos.begin(rover.pulses());

        let link = serial_link::SerialLink::new(dp.USART2, &clock_cfg);
        let tick = tick_timer::TickTimer::new(dp.TIM6, &clock_cfg, TELEMETRY_HZ);

        let dma1 = Dma::new(dp.DMA1);
        dma::enable_mux1();
        dma::mux(DmaPeriph::Dma1, DmaChannel::C1, DmaInput::Adc1);
        dma::mux(DmaPeriph::Dma1, serial_link::TX_DMA_CHANNEL, DmaInput::Usart2Tx);

        pinout::battery::CONTROL_SENSE.init();
        pinout::battery::DRIVE_SENSE.init();

        let mut adc1 = Adc::new_adc1(
            dp.ADC1,
            AdcDevice::One,
            Default::default(),
            clock_cfg.systick(),
        );

        for i in 0..SAMPLING_COUNT {
            adc1.set_sequence(ADC1_SEQUENCE[i], i as u8 + 1);
            adc1.set_input_type(ADC1_SEQUENCE[i], InputType::SingleEnded);
            // Divider outputs are high impedance
            adc1.set_sample_time(ADC1_SEQUENCE[i], SampleTime::T247);
        }
        adc1.set_sequence_len(SAMPLING_COUNT as u8);
        adc1.set_align(Align::Left);

        (
            Shared { link, rover, dma1 },
            Local {
                servos,
                decoder: PacketDecoder::new(),
                tick,
                adc1,
            },
        )
    }

    #[task(binds = EXTI0, priority = 3)]
    fn hall_edge(_cx: hall_edge::Context) {
        hall_input::clear_hall_interrupt();
        if !ROUTER.dispatch(hall_input::HALL_LINE) {
            defmt::trace!("HALL: edge before bind");
        }
    }

    #[task(binds = USART2, shared = [link], local = [decoder], priority = 2)]
    fn serial_rx(mut cx: serial_rx::Context) {
        let byte = cx.shared.link.lock(|link| link.read_byte());

        match cx.local.decoder.push(byte) {
            Some(Ok(cmd)) => {
                if apply_command::spawn(cmd).is_err() {
                    defmt::warn!("LINK: seq {} skipped, previous command pending", cmd.seq);
                }
            }
            Some(Err(err)) => defmt::warn!("LINK: frame rejected: {}", err),
            None => {}
        }
    }

    #[task(priority = 1, shared = [rover], local = [servos])]
    async fn apply_command(mut cx: apply_command::Context, cmd: ControlCommand) {
        if let Some(pulses) = cx.shared.rover.lock(|rover| rover.apply(&cmd)) {
            cx.local.servos.apply(pulses);
        }
    }

    #[task(binds = TIM6_DACUNDER, local = [tick, adc1], priority = 2)]
    fn telemetry_tick(cx: telemetry_tick::Context) {
        cx.local.tick.clear();

        // Previous conversion finished long ago at this rate, none has run on the first tick
        let battery = if ADC_READY.load(Ordering::Acquire) {
            Some(unsafe { (ADC_READ_BUF[0], ADC_READ_BUF[1]) })
        } else {
            None
        };

        unsafe {
            cx.local.adc1.read_dma(
                &mut ADC_READ_BUF,
                &ADC1_SEQUENCE,
                DmaChannel::C1,
                Default::default(),
                DmaPeriph::Dma1,
            )
        };

        if report::spawn(battery).is_err() {
            defmt::trace!("ROVER: telemetry cycle skipped, previous report pending");
        }
    }

    #[task(priority = 1, shared = [rover, link])]
    async fn report(mut cx: report::Context, battery: Option<(u16, u16)>) {
        let kinematics = HALL.snapshot();
        let telemetry = cx.shared.rover.lock(|rover| {
            if let Some((control_adc, drive_adc)) = battery {
                rover.tick_batteries(control_adc, drive_adc);
            }
            rover.telemetry(&kinematics)
        });

        match telemetry.format() {
            // Lock only covers the buffer copy and DMA start, receive keeps running
            Ok(line) => match cx.shared.link.lock(|link| link.send(line.as_bytes())) {
                Ok(()) => {}
                Err(serial_link::SendError::Busy) => {
                    defmt::trace!("LINK: telemetry skipped, previous line still sending")
                }
                Err(serial_link::SendError::TooLong) => {
                    defmt::warn!("LINK: telemetry line exceeds transmit buffer")
                }
            },
            Err(_) => defmt::warn!("LINK: telemetry line overflow"),
        }
        defmt::debug!("ROVER: {} Hz, {}", kinematics.frequency_hz, telemetry);
    }

    #[task(binds = DMA1_CH1, shared = [dma1], priority = 1)]
    fn adc_end_read(mut cx: adc_end_read::Context) {
        dma::clear_interrupt(
            DmaPeriph::Dma1,
            DmaChannel::C1,
            DmaInterrupt::TransferComplete,
        );
        cx.shared.dma1.lock(|dma1| dma1.stop(DmaChannel::C1));
        ADC_READY.store(true, Ordering::Release);
    }

    #[task(binds = DMA1_CH2, shared = [dma1], priority = 1)]
    fn link_end_write(mut cx: link_end_write::Context) {
        dma::clear_interrupt(
            DmaPeriph::Dma1,
            serial_link::TX_DMA_CHANNEL,
            DmaInterrupt::TransferComplete,
        );
        cx.shared.dma1.lock(|dma1| dma1.stop(serial_link::TX_DMA_CHANNEL));
        serial_link::tx_complete();
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
