use std::fmt::Write;

use cloudy_core::{
    Screen,
    assets::{Animation, Repeat},
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn art(animation: Animation) -> &'static [&'static str] {
    match animation {
        Animation::Sun => &[
            r"    \   /    ",
            r"     .-.     ",
            r"  ― (   ) ―  ",
            r"     `-'     ",
            r"    /   \    ",
        ],
        Animation::Cloud => &[
            r"             ",
            r"     .--.    ",
            r"  .-(    ).  ",
            r" (___.__)__) ",
            r"             ",
        ],
        Animation::Rain => &[
            r"     .-.     ",
            r"    (   ).   ",
            r"   (___(__)  ",
            r"    ‚‘‚‘‚‘   ",
            r"    ‚’‚’‚’   ",
        ],
        Animation::Snow => &[
            r"     .-.     ",
            r"    (   ).   ",
            r"   (___(__)  ",
            r"    *  *  *  ",
            r"   *  *  *   ",
        ],
        Animation::Stormy => &[
            r"     .-.     ",
            r"    (   ).   ",
            r"   (___(__)  ",
            r"    ⚡‘‘⚡‘‘  ",
            r"    ‘‘‘‘‘‘   ",
        ],
    }
}

/// One full frame of the dashboard.
pub fn render(screen: &Screen) -> String {
    let art = art(screen.backdrop.scene.animation);
    let side = [
        format!("{}  {}", screen.location, screen.temperature),
        screen.condition.clone(),
        format!("{}   {}", screen.max, screen.min),
        format!("{}, {}", screen.day, screen.date),
        String::new(),
    ];

    let mut out = String::new();
    for (left, right) in art.iter().zip(side.iter()) {
        let _ = writeln!(out, "{left}  {right}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  Humidity  {:<12} Wind     {}", screen.humidity, screen.wind_speed);
    let _ = writeln!(out, "  Sunrise   {:<12} Sunset   {}", screen.sunrise, screen.sunset);
    let _ = writeln!(out, "  Sea       {}", screen.pressure);

    let backdrop = &screen.backdrop;
    let looping = if backdrop.video_repeat == Repeat::All { ", looping" } else { "" };
    let state = if backdrop.video_playing { "playing" } else { "paused" };
    let _ = writeln!(
        out,
        "  [{}.json] [{}.mp4 {state}{looping}]",
        backdrop.scene.animation.asset(),
        backdrop.scene.video.asset(),
    );

    out
}

/// Frame for the live dashboard: clears the terminal first.
pub fn redraw(screen: &Screen) -> String {
    format!("{CLEAR_SCREEN}{}\nType a place and press Enter to search.\n", render(screen))
}
