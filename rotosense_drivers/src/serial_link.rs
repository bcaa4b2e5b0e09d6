use core::sync::atomic::{AtomicBool, Ordering};

use hal::{
    clocks::Clocks,
    dma::{DmaChannel, DmaPeriph},
    pac::USART2,
    usart::{Usart, UsartConfig, UsartInterrupt},
};
use rotosense_algo::link::telemetry::LINE_CAPACITY;

use super::pinout;

/// Link speed shared with the companion computer
pub const BAUD: u32 = 115_200;

/// DMA channel feeding the transmit register, muxed to USART2_TX by the app
pub const TX_DMA_CHANNEL: DmaChannel = DmaChannel::C2;

// Outgoing line, owned by the DMA while TX_BUSY is set
static mut TX_BUF: [u8; LINE_CAPACITY] = [0; LINE_CAPACITY];
static TX_BUSY: AtomicBool = AtomicBool::new(false);

/// Why a line was not queued for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Previous line still on the wire
    Busy,
    /// Line longer than the transmit buffer
    TooLong,
}

/// Full-duplex UART to the companion computer: control frames in, telemetry lines out.
///
/// Receive is byte-per-interrupt, transmit runs on DMA so the receive interrupt is
/// never held off for longer than it takes to start a transfer.
pub struct SerialLink {
    usart: Usart<USART2>,
}

impl SerialLink {
    pub fn new(usart2: USART2, clock_cfg: &Clocks) -> Self {
        pinout::serial::USART2_TX.init();
        pinout::serial::USART2_RX.init();

        let mut usart = Usart::new(usart2, BAUD, UsartConfig::default(), clock_cfg);
        usart.enable_interrupt(UsartInterrupt::ReadNotEmpty);

        SerialLink { usart }
    }

    /// Takes the byte that raised the receive interrupt
    #[inline(always)]
    pub fn read_byte(&mut self) -> u8 {
        // An overrun blocks further receive interrupts until cleared
        self.usart.clear_interrupt(UsartInterrupt::Overrun);
        self.usart.read_one()
    }

    /// Copies `bytes` into the transmit buffer and starts the DMA transfer. Returns at once.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        if bytes.len() > LINE_CAPACITY {
            return Err(SendError::TooLong);
        }
        if TX_BUSY.swap(true, Ordering::Acquire) {
            return Err(SendError::Busy);
        }

        unsafe {
            TX_BUF[..bytes.len()].copy_from_slice(bytes);
            self.usart.write_dma(
                &TX_BUF[..bytes.len()],
                TX_DMA_CHANNEL,
                Default::default(),
                DmaPeriph::Dma1,
            );
        }
        Ok(())
    }
}

/// Releases the transmit buffer, call from the TX DMA transfer-complete interrupt
/// after the channel has been stopped.
#[inline(always)]
pub fn tx_complete() {
    TX_BUSY.store(false, Ordering::Release);
}
