//! XIAO-SYNTH is [Embassy](https://embassy.dev)-based firmware for a small MIDI bridge which drives a SAM2695
//! General MIDI synthesizer chip over its serial input. The firmware runs on the [Nucleo-F767ZI development
//! board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered by an F7-series STM32
//! microcontroller.
//!
//! MIDI received from a USB host is forwarded to the synth unchanged, except for the controllers CC 13 to 15, which
//! are consumed as commands. Together with four pushbuttons, those step through programs, switch between the General MIDI and MT-32 compatible banks, and
//! toggle reverb; see [`Controller`] for the details. A status LED shows whether a host is connected.

#![no_std]
#![no_main]

mod buttons;
mod synth;

use crate::synth::{SYNTH_BAUD_RATE, SYNTH_QUEUE, Synth};
use defmt::{panic, *};
use embassy_executor::Spawner;
use embassy_stm32::{
    Config, bind_interrupts,
    exti::ExtiInput,
    gpio::{Level, Output, Pull, Speed},
    peripherals, usart,
    time::Hertz,
    usb,
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex};
use embassy_usb::{Builder, UsbDevice, class::midi::MidiClass, driver::EndpointError};
use static_cell::StaticCell;
use xiao_synth_lib::{
    button::Button,
    configuration::Capability,
    connection::ConnectionIndicator,
    controller::{Controller, Outbox},
    midi::{MAX_USB_PACKET_SIZE, bytes_to_midi_message_iterator},
};

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    }
);

type ControllerAsyncMutex = mutex::Mutex<CriticalSectionRawMutex, Controller>;
type UsbDriver = usb::Driver<'static, peripherals::USB_OTG_FS>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing XIAO-SYNTH");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: the 8MHz clock supplied by the on-board ST-LINK
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // USB OTG FS needs its own 48MHz clock, taken from PLLQ
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    let capabilities = Capability::all_features();
    info!("Enabled features: {}", capabilities);

    static CONTROLLER: StaticCell<ControllerAsyncMutex> = StaticCell::new();
    let controller = CONTROLLER.init(mutex::Mutex::new(Controller::new(capabilities)));

    // the synth only listens, so only the transmit half of USART2 is needed (TX on PD5, DMA1 stream 6)
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = SYNTH_BAUD_RATE;
    let uart = unwrap!(usart::UartTx::new(
        p.USART2,
        p.PD5,
        p.DMA1_CH6,
        uart_config
    ));
    unwrap!(spawner.spawn(synth::synth_task(uart, SYNTH_QUEUE.receiver())));

    // start the synth out on a known patch
    let mut outbox = Outbox::default();
    controller.lock().await.announce(&mut outbox);
    Synth::default().flush(&mut outbox).await;

    if capabilities.contains(Capability::Buttons) {
        let buttons = [
            (Button::A, ExtiInput::new(p.PD0, p.EXTI0, Pull::Up)),
            (Button::B, ExtiInput::new(p.PD1, p.EXTI1, Pull::Up)),
            (Button::C, ExtiInput::new(p.PG2, p.EXTI2, Pull::Up)),
            (Button::D, ExtiInput::new(p.PG3, p.EXTI3, Pull::Up)),
        ];
        for (button, input) in buttons {
            unwrap!(spawner.spawn(buttons::button_task(input, button, controller)));
        }
    }

    if !capabilities.contains(Capability::Usb) {
        info!("USB MIDI disabled");
        return;
    }

    // green user LED (LD1)
    let status_led = Output::new(p.PB0, Level::Low, Speed::Low);

    // Create the driver, from the HAL.
    static ENDPOINT_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let mut config = embassy_stm32::usb::Config::default();

    // The Nucleo's user USB port (CN13) cannot power the board, so the device is self-powered and must enable
    // vbus_detection to comply with USB 2.0.
    config.vbus_detection = true;

    let driver = usb::Driver::new_fs(
        p.USB_OTG_FS,
        Irqs,
        p.PA12,
        p.PA11,
        ENDPOINT_OUT_BUFFER.init([0; 256]),
        config,
    );

    // per https://pid.codes, FOSS projects can apply to be listed under the vendor ID owned by InterBiometrics
    let vendor_id = 0x1209;
    // product ID borrows the number of the synth chip
    let product_id = 0x2695;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("XIAO-SYNTH");
    config.product = Some("XIAO-SYNTH USB MIDI");
    config.self_powered = true;
    config.max_power = 0;

    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );

    let class = MidiClass::new(&mut builder, 0, 1, MAX_USB_PACKET_SIZE as u16);
    let usb = builder.build();

    unwrap!(spawner.spawn(usb_task(usb)));
    unwrap!(spawner.spawn(midi_task(class, controller, status_led)));
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

/// Task responsible for MIDI arriving from the USB host. Mirrors the connection state onto the status LED.
#[embassy_executor::task]
async fn midi_task(
    mut class: MidiClass<'static, UsbDriver>,
    controller: &'static ControllerAsyncMutex,
    mut status_led: Output<'static>,
) -> ! {
    let mut indicator = ConnectionIndicator::default();
    let synth = Synth::default();
    loop {
        class.wait_connection().await;
        show_connection(&mut indicator, &mut status_led, true);
        let _ = process_midi(&mut class, controller, &synth).await;
        show_connection(&mut indicator, &mut status_led, false);
    }
}

fn show_connection(indicator: &mut ConnectionIndicator, led: &mut Output<'static>, connected: bool) {
    if let Some(status) = indicator.update(connected) {
        info!("USB {}", status);
        if status.led_on() {
            led.set_high();
        } else {
            led.set_low();
        }
    }
}

#[doc(hidden)]
struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => panic!("Buffer overflow"),
            EndpointError::Disabled => Disconnected {},
        }
    }
}

/// Helper function which interprets data received over USB.
///
/// Every message except the controller's commands is passed through to the synth, followed by the controller's
/// response. A packet is handled in full before its output is written, so the controller is never held while
/// waiting on the serial line.
async fn process_midi<'d, T: usb::Instance + 'd>(
    class: &mut MidiClass<'d, usb::Driver<'d, T>>,
    controller: &'static ControllerAsyncMutex,
    synth: &Synth,
) -> Result<(), Disconnected> {
    let mut buf = [0; MAX_USB_PACKET_SIZE];
    let mut outbox = Outbox::default();
    loop {
        let n = class.read_packet(&mut buf).await?;
        {
            let mut controller = controller.lock().await;
            for message in bytes_to_midi_message_iterator(&buf[..n]) {
                outbox.receive(&mut controller, &message);
            }
        }
        synth.flush(&mut outbox).await;
    }
}
