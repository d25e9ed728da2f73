//! Tasks related to the pushbutton panel.

use crate::{ControllerAsyncMutex, synth::Synth};
use defmt::info;
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Timer};
use xiao_synth_lib::{
    button::{Button, EdgeDetector},
    controller::Outbox,
};

/// How long contacts are given to stop bouncing before the level is sampled.
const DEBOUNCE: Duration = Duration::from_millis(20);

/// Handles transitions of a single button, passing debounced edges to the controller.
///
/// Inputs are pulled up, so a pressed button reads low.
#[embassy_executor::task(pool_size = 4)]
pub async fn button_task(
    mut input: ExtiInput<'static>,
    button: Button,
    controller: &'static ControllerAsyncMutex,
) -> ! {
    let synth = Synth::default();
    let mut outbox = Outbox::default();
    let mut detector = EdgeDetector::default();
    loop {
        input.wait_for_any_edge().await;
        Timer::after(DEBOUNCE).await;

        if let Some(edge) = detector.update(input.is_low()) {
            info!("Button {}: {}", button, edge);
            controller
                .lock()
                .await
                .on_button_edge(button, edge, &mut outbox);
            synth.flush(&mut outbox).await;
        }
    }
}
