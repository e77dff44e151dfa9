use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Europe::Paris;
use tzcrontab::{Cron, Schedule};

fn main() {
    // Every night at 02:30, Paris time
    let cron: Cron = "30 2 * * *".parse().expect("Couldn't parse cron string");
    let schedule = Schedule::new(cron, Paris).expect("Schedule never fires");

    // Poll every half hour across the spring-forward night and the fall-back night of 2017
    for (from, to) in [((3, 25), (3, 27)), ((10, 28), (10, 30))] {
        let mut now = Paris
            .with_ymd_and_hms(2017, from.0, from.1, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let end = Paris
            .with_ymd_and_hms(2017, to.0, to.1, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let mut last_run = now - Duration::days(1);

        println!("Schedule {}", schedule);
        while now < end {
            let state = schedule
                .is_due_at(&last_run, now)
                .expect("Schedule ran out of occurrences");
            println!(
                "{}  due: {:<5}  check again in {}s",
                now.with_timezone(&Paris),
                state.due,
                state.remaining_seconds
            );
            if state.due {
                last_run = now;
            }
            now += Duration::minutes(30);
        }
        println!();
    }
}
