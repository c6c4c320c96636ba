//! HTML for the alert surface.

use rand::seq::SliceRandom;

use crate::prayer::Prayer;

pub const QUOTES: &[&str] = &[
    "\"Every soul shall taste death, and you will only be paid your full recompense on the Day of Resurrection.\" (QS. Ali Imran: 185)",
    "\"The life of this world is nothing but the enjoyment of delusion.\" (QS. Ali Imran: 185)",
    "\"Indeed, prayer prohibits immorality and wrongdoing.\" (QS. Al-Ankabut: 45)",
    "\"I did not create the jinn and mankind except to worship Me.\" (QS. Adz-Dzariyat: 56)",
    "\"So remember Me; I will remember you.\" (QS. Al-Baqarah: 152)",
    "\"Indeed, with hardship comes ease.\" (QS. Al-Insyirah: 6)",
    "\"Prayer is the pillar of the religion.\" (Hadith)",
    "\"Race toward forgiveness from your Lord and a Garden as wide as the heavens and the earth.\" (QS. Al-Hadid: 21)",
    "\"Let not the worldly life delude you.\" (QS. Fathir: 5)",
    "\"Death is enough of a reminder.\" (Umar ibn al-Khattab)",
    "\"The grave is the first stage of the Hereafter.\" (Hadith)",
    "\"Pray before prayers are offered over you.\"",
];

pub fn random_quote() -> &'static str {
    QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

pub fn audio_file(prayer: Prayer) -> &'static str {
    match prayer {
        Prayer::Subuh => "adzan-subuh.mp3",
        _ => "adzan.mp3",
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_alert(prayer: Prayer, time: &str, quote: &str, with_audio: bool) -> String {
    let name = escape_html(prayer.display_name());
    let time = escape_html(time);
    let message = escape_html(prayer.message());
    let quote = escape_html(quote);

    let audio = if with_audio {
        format!(
            r#"<audio id="adzan" src="/media/{}" autoplay preload="auto"></audio>"#,
            audio_file(prayer)
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<title>{name} Prayer Time</title>
</head>
<body>
<div class="container">
<div class="prayer-label">It's Time for</div>
<div class="prayer-name">{name}</div>
<div class="prayer-time">{time}</div>
<div class="message">{message}</div>
<blockquote class="quote">{quote}</blockquote>
<form method="post" action="/api/alert/close"><button class="close-btn">Close</button></form>
</div>
{audio}
</body>
</html>"#
    )
}
