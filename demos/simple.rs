use cfex_core::load_source;

fn main() {
    let cfex_data = "\
user = sync
host = files.example.com
url = ssh://{{user}}@{{host}}

[server]
port = 22
addr = $host
";

    match load_source(cfex_data, "example.cfex") {
        Ok(result) => {
            let json_output = result.to_json().unwrap();
            println!("Successfully resolved CFEX to JSON:\n{json_output}");
        }
        Err(e) => {
            eprintln!("Failed to load CFEX: {e:?}");
        }
    }
}
