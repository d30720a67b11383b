use inventorydb::{Device, DeviceListing, DeviceRepository};

const HEADERS: [&str; 4] = ["serialNumber", "name", "status", "lastConnectionDate"];

fn columns(device: &Device) -> [String; 4] {
    [
        device.serial_number.clone(),
        device.name.clone(),
        device.status.to_string(),
        device.last_connection_date.format("%Y-%m-%d %H:%M").to_string(),
    ]
}

pub fn print_devices(devices: &[Device]) {
    if devices.is_empty() {
        println!("No devices");
        return;
    }

    let rows: Vec<[String; 4]> = devices.iter().map(columns).collect();

    // Calculate column widths
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let header: Vec<String> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{:width$}", col, width = widths[i]))
        .collect();
    println!("{}", header.join(" | "));

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    println!("{}", separator);

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, val)| format!("{:width$}", val, width = widths[i]))
            .collect();
        println!("{}", line.join(" | "));
    }
}

pub fn print_device(device: &Device) {
    for (header, value) in HEADERS.iter().zip(columns(device)) {
        println!("{:>18}: {}", header, value);
    }
}

pub fn print_page_footer<R: DeviceRepository>(listing: &DeviceListing<R>) {
    let paginator = listing.paginator();
    let range = paginator.page_range();
    println!(
        "\n{}-{} of {} {} device(s), page {} of {}",
        (range.start + 1).min(range.end),
        range.end,
        listing.total_items(),
        listing.filter(),
        paginator.current_page(),
        paginator.total_pages().max(1)
    );

    let mut hints = Vec::new();
    if paginator.has_previous() {
        hints.push(format!("--page {} for previous", paginator.current_page() - 1));
    }
    if paginator.has_next() {
        hints.push(format!("--page {} for next", paginator.current_page() + 1));
    }
    if !hints.is_empty() {
        println!("{}", hints.join(", "));
    }
}
