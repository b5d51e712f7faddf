use crate::config::PresetModel;

const MODEL_OPTIONS_SLOT: &str = "{{MODEL_OPTIONS}}";

pub fn render_index(presets: &[PresetModel]) -> String {
    let options: String = presets
        .iter()
        .map(|preset| {
            let id = escape_html(preset.id);
            format!(r#"<option value="{id}">{id}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("\n                    ");
    INDEX_TEMPLATE.replace(MODEL_OPTIONS_SLOT, &options)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

const INDEX_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Camera Angle Studio</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
        }

        .container {
            background: white;
            border-radius: 20px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.3);
            max-width: 900px;
            width: 100%;
            padding: 40px;
        }

        h1 {
            color: #333;
            margin-bottom: 10px;
            font-size: 2em;
        }

        .subtitle {
            color: #666;
            margin-bottom: 30px;
            font-size: 0.9em;
        }

        .row {
            margin-bottom: 18px;
        }

        label {
            display: block;
            color: #667eea;
            font-weight: 600;
            font-size: 0.85em;
            text-transform: uppercase;
            letter-spacing: 1px;
            margin-bottom: 6px;
        }

        input[type="text"], input[type="password"], textarea, select {
            width: 100%;
            padding: 10px;
            border: 2px solid #e0e0e0;
            border-radius: 10px;
            font-size: 1em;
        }

        input[type="range"] {
            width: 100%;
        }

        .value {
            color: #333;
            font-weight: 600;
        }

        .custom {
            display: none;
            background: #f8f9ff;
            border-radius: 10px;
            padding: 15px;
        }

        button {
            background: #667eea;
            color: white;
            border: none;
            border-radius: 20px;
            padding: 12px 30px;
            font-size: 1em;
            font-weight: 600;
            cursor: pointer;
        }

        button:disabled {
            background: #aaa;
        }

        .images {
            display: flex;
            gap: 20px;
            margin-top: 30px;
        }

        .images img {
            max-width: 100%;
            border-radius: 10px;
            box-shadow: 0 4px 15px rgba(0,0,0,0.1);
        }

        .error {
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
            margin-top: 20px;
            display: none;
            white-space: pre-wrap;
        }

        .message {
            background: #f8f9ff;
            border-radius: 10px;
            padding: 15px;
            margin-top: 20px;
            display: none;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>🎥 Camera Angle Studio</h1>
        <p class="subtitle">Re-shoot your character from any angle</p>

        <form id="form">
            <div class="row">
                <label for="image">Image</label>
                <input type="file" id="image" name="image" accept=".png,.jpg,.jpeg,.webp">
            </div>

            <div class="row">
                <label for="prompt">Prompt</label>
                <textarea id="prompt" name="prompt" rows="2"></textarea>
            </div>

            <div class="row">
                <label for="h_angle">Rotation <span class="value" id="h_angle_value">0</span>°</label>
                <input type="range" id="h_angle" name="h_angle" min="-180" max="180" value="0">
            </div>

            <div class="row">
                <label for="v_angle">Tilt (up = camera above) <span class="value" id="v_angle_value">0</span>°</label>
                <input type="range" id="v_angle" name="v_angle" min="-90" max="90" value="0">
            </div>

            <div class="row">
                <label for="zoom">Zoom <span class="value" id="zoom_value">50</span></label>
                <input type="range" id="zoom" name="zoom" min="0" max="100" value="50">
            </div>

            <div class="row">
                <label for="model_source">Model source</label>
                <select id="model_source" name="model_source">
                    <option value="preset">Preset</option>
                    <option value="custom">Custom endpoint</option>
                </select>
            </div>

            <div class="row" id="preset_fields">
                <label for="model_name">Model</label>
                <select id="model_name" name="model_name">
                    {{MODEL_OPTIONS}}
                </select>
            </div>

            <div class="row custom" id="custom_fields">
                <label for="custom_api_url">API URL</label>
                <input type="text" id="custom_api_url" name="custom_api_url">
                <label for="custom_api_key">API key</label>
                <input type="password" id="custom_api_key" name="custom_api_key">
                <label for="custom_model_name">Model name</label>
                <input type="text" id="custom_model_name" name="custom_model_name">
                <label for="custom_api_schema">Request format</label>
                <select id="custom_api_schema" name="custom_api_schema">
                    <option value="">Detect from URL</option>
                    <option value="openai">OpenAI image edit</option>
                    <option value="fal">fal.ai</option>
                </select>
            </div>

            <button type="submit" id="submit">Generate</button>
        </form>

        <div class="error" id="error"></div>
        <div class="message" id="message"></div>

        <div class="images">
            <img id="original" alt="" style="display:none">
            <img id="result" alt="" style="display:none">
        </div>
    </div>

    <script>
        const form = document.getElementById('form');
        const submit = document.getElementById('submit');
        const errorDiv = document.getElementById('error');
        const messageDiv = document.getElementById('message');
        const original = document.getElementById('original');
        const result = document.getElementById('result');
        const source = document.getElementById('model_source');

        for (const id of ['h_angle', 'v_angle', 'zoom']) {
            const input = document.getElementById(id);
            const value = document.getElementById(id + '_value');
            input.addEventListener('input', () => { value.textContent = input.value; });
        }

        source.addEventListener('change', () => {
            const custom = source.value === 'custom';
            document.getElementById('custom_fields').style.display = custom ? 'block' : 'none';
            document.getElementById('preset_fields').style.display = custom ? 'none' : 'block';
        });

        form.addEventListener('submit', async (e) => {
            e.preventDefault();
            submit.disabled = true;
            errorDiv.style.display = 'none';
            messageDiv.style.display = 'none';
            result.style.display = 'none';

            try {
                const response = await fetch('/generate', {
                    method: 'POST',
                    body: new FormData(form)
                });
                const body = await response.json();

                if (body.original_image) {
                    original.src = body.original_image;
                    original.style.display = 'block';
                }

                if (!body.success) {
                    throw new Error(body.error || 'Generation failed');
                }

                if (body.data.image_url) {
                    result.src = body.data.image_url;
                    result.style.display = 'block';
                }
                if (body.data.message) {
                    messageDiv.textContent = body.data.message;
                    messageDiv.style.display = 'block';
                }
            } catch (error) {
                errorDiv.textContent = 'Error: ' + error.message;
                errorDiv.style.display = 'block';
            } finally {
                submit.disabled = false;
            }
        });
    </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRESET_MODELS;

    #[test]
    fn lists_every_preset() {
        let html = render_index(PRESET_MODELS);
        assert!(html.contains(r#"<option value="gemini-2.5-flash-image">"#));
        assert!(html.contains(r#"<option value="qwen-image-edit-lora">"#));
        assert!(!html.contains(MODEL_OPTIONS_SLOT));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&"#), "&lt;a href=&quot;x&quot;&gt;&amp;");
    }
}
