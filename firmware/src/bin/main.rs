#![no_std]
#![no_main]

use defmt::{info, panic};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use joybus_adapter::{run_poll_scheduler, JoybusPrograms, Mailbox, PioPulseLink};
use static_cell::StaticCell;

#[cfg(feature = "console-port")]
use joybus_adapter::run_command_responder;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

/// Latest controller state; one reader slot for the console responder.
type StateMailbox = Mailbox<CriticalSectionRawMutex, 1>;

type ControllerLink = PioPulseLink<'static, PIO0, 0, 1>;
#[cfg(feature = "console-port")]
type ConsoleLink = PioPulseLink<'static, PIO0, 2, 3>;

static MAILBOX: StaticCell<StateMailbox> = StaticCell::new();
static PROGRAMS: StaticCell<JoybusPrograms<'static, PIO0>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Joybus adapter starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let mailbox = MAILBOX.init(Mailbox::new());

    // --- PIO Setup ---
    let Pio {
        mut common,
        sm0,
        sm1,
        sm2,
        sm3,
        ..
    } = Pio::new(p.PIO0, Irqs);
    let programs = PROGRAMS.init(JoybusPrograms::load(&mut common));

    let mut controller_pin = common.make_pio_pin(p.PIN_0);
    controller_pin.set_pull(Pull::Up);
    let controller_link = PioPulseLink::new(programs, sm0, sm1, controller_pin);

    // On-board LED mirrors whether a controller answers
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(poller_task(controller_link, led, mailbox).unwrap());

    #[cfg(feature = "console-port")]
    {
        let mut console_pin = common.make_pio_pin(p.PIN_1);
        console_pin.set_pull(Pull::Up);
        let console_link = PioPulseLink::new(programs, sm2, sm3, console_pin);
        spawner.spawn(responder_task(console_link, mailbox).unwrap());
    }
    #[cfg(not(feature = "console-port"))]
    let _ = (sm2, sm3);

    info!("Joybus adapter initialized, polling controller...");
}

/// Poll task - polls the controller and publishes state changes.
#[embassy_executor::task]
async fn poller_task(link: ControllerLink, led: Output<'static>, mailbox: &'static StateMailbox) {
    match run_poll_scheduler(link, led, mailbox).await {
        Ok(never) => match never {},
        Err(e) => panic!("Poll scheduler failed to start: {:?}", e),
    }
}

/// Console task - answers status and poll commands with the latest state.
#[cfg(feature = "console-port")]
#[embassy_executor::task]
async fn responder_task(link: ConsoleLink, mailbox: &'static StateMailbox) {
    match run_command_responder(link, mailbox).await {
        Ok(never) => match never {},
        Err(e) => panic!("Command responder failed to start: {:?}", e),
    }
}
